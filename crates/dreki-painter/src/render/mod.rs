//! Rendering subsystem — the device seam and its wgpu and headless backends.

pub mod device;
pub mod gpu;
pub mod recording;
pub mod target;
pub mod wgpu_device;

pub use device::{BufferId, RenderDevice, ShaderHandle, TEXTURE_UNITS, TextureHandle};
pub use gpu::GpuContext;
pub use recording::{DeviceCall, RecordingDevice};
pub use target::RenderTarget;
pub use wgpu_device::WgpuDevice;
