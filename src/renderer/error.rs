use ash::prelude::VkResult;
use ash::vk;

/// A Vulkan call that returned an error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{call} failed with {code:?} ({})", .code.as_raw())]
pub struct GpuCallError {
    pub call: &'static str,
    pub code: vk::Result,
}

impl GpuCallError {
    pub fn new(call: &'static str, code: vk::Result) -> Self {
        Self { call, code }
    }

    /// Raw numeric error code
    pub fn raw_code(&self) -> i32 {
        self.code.as_raw()
    }
}

pub trait VkResultExt<T> {
    /// Tag a failed call with the name of the Vulkan entry point
    fn call(self, call: &'static str) -> Result<T, GpuCallError>;
}

impl<T> VkResultExt<T> for VkResult<T> {
    fn call(self, call: &'static str) -> Result<T, GpuCallError> {
        self.map_err(|code| GpuCallError::new(call, code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_call_and_code() {
        let err = vk::Result::ERROR_OUT_OF_DEVICE_MEMORY
            .result()
            .call("vkAllocateMemory")
            .unwrap_err();
        assert_eq!(err.call, "vkAllocateMemory");
        assert_eq!(err.raw_code(), -2);
        let message = err.to_string();
        assert_eq!(message, "vkAllocateMemory failed with ERROR_OUT_OF_DEVICE_MEMORY (-2)");
    }

    #[test]
    fn message_carries_numeric_code() {
        let err = GpuCallError::new("vkQueueSubmit", vk::Result::ERROR_DEVICE_LOST);
        assert!(err.to_string().contains("(-4)"));
    }

    #[test]
    fn success_passes_value_through() {
        let value: VkResult<u32> = Ok(7);
        assert_eq!(value.call("vkNothing"), Ok(7));
    }
}
