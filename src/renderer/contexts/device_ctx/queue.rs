use ash::vk;

pub struct Queue {
    pub family: QueueFamily,
    pub handle: vk::Queue,
}

impl Queue {
    pub fn new(
        family: QueueFamily,
        handle: vk::Queue,
    ) -> Self {
        Self {
            family,
            handle,
        }
    }
}

#[derive(Clone, Debug)]
pub struct QueueFamily {
    pub index: u32,
    pub properties: vk::QueueFamilyProperties,
    supports_present: bool,
}

impl QueueFamily {
    pub fn new(
        index: u32,
        properties: vk::QueueFamilyProperties,
        supports_present: bool
    ) -> Self {
        Self {
            index,
            properties,
            supports_present,
        }
    }

    pub fn supports_present(&self) -> bool {
        self.supports_present
    }

    pub fn supports_graphics(&self) -> bool {
        self.properties.queue_flags.contains(vk::QueueFlags::GRAPHICS)
    }
}

/// Index of the first family that can both draw and present
pub fn find_graphics_present_family(
    families: &[vk::QueueFamilyProperties],
    supports_present: impl Fn(u32) -> bool,
) -> Option<QueueFamily> {
    families
        .iter()
        .enumerate()
        .map(|(i, props)| QueueFamily::new(i as u32, *props, supports_present(i as u32)))
        .find(|family| {
            family.supports_graphics()
                && family.properties.queue_count > 0
                && family.supports_present()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn picks_first_graphics_family_that_presents() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let found = find_graphics_present_family(&families, |i| i == 2).unwrap();
        assert_eq!(found.index, 2);
        assert!(found.supports_graphics());
        assert!(found.supports_present());

        let found = find_graphics_present_family(&families, |_| true).unwrap();
        assert_eq!(found.index, 1);
    }

    #[test]
    fn no_family_without_present() {
        let families = [family(vk::QueueFlags::GRAPHICS)];
        assert!(find_graphics_present_family(&families, |_| false).is_none());
    }
}
