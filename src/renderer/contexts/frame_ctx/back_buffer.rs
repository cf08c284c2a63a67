use color_eyre::eyre::eyre;
use color_eyre::Result;

/// Usage of one swap-chain image as seen by the frame loop.
/// The only legal cycle is Presentable -> RenderTarget -> Presentable.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BackBufferState {
    #[default]
    Presentable,
    RenderTarget,
}

impl BackBufferState {
    pub fn begin_rendering(&mut self) -> Result<()> {
        self.transition(Self::Presentable, Self::RenderTarget)
    }

    pub fn end_rendering(&mut self) -> Result<()> {
        self.transition(Self::RenderTarget, Self::Presentable)
    }

    fn transition(&mut self, from: Self, to: Self) -> Result<()> {
        if *self != from {
            return Err(eyre!("Back buffer cannot go from {:?} to {:?}", self, to));
        }
        *self = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_presentable() {
        assert_eq!(BackBufferState::default(), BackBufferState::Presentable);
    }

    #[test]
    fn full_cycle_is_legal() {
        let mut state = BackBufferState::default();
        state.begin_rendering().unwrap();
        assert_eq!(state, BackBufferState::RenderTarget);
        state.end_rendering().unwrap();
        assert_eq!(state, BackBufferState::Presentable);
        state.begin_rendering().unwrap();
    }

    #[test]
    fn rejects_double_begin() {
        let mut state = BackBufferState::default();
        state.begin_rendering().unwrap();
        assert!(state.begin_rendering().is_err());
        assert_eq!(state, BackBufferState::RenderTarget);
    }

    #[test]
    fn rejects_present_without_render() {
        let mut state = BackBufferState::default();
        assert!(state.end_rendering().is_err());
        assert_eq!(state, BackBufferState::Presentable);
    }
}
