/// "Internals" are low-level helpers used by the contexts and resources: the swap chain and image barriers.

pub mod swapchain;
pub mod util;
