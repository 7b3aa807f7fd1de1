/*!
# Galaxy 3D Rendering Device - Software Backend

CPU implementation of the [`Backend`](galaxy_3d_rendering_device::galaxy3d::Backend)
trait. Resources live in host memory, transfers and render pass clears run
immediately, and draws/dispatches are validated and counted without being
rasterized. Shader interfaces are reflected from SPIR-V with `spirq`.

The backend makes the whole rendering device usable in tests and headless
tools without a GPU.

# Example

```
use galaxy_3d_rendering_device::galaxy3d::{DeviceConfig, RenderingDevice};
use galaxy_3d_rendering_device_backend_soft::SoftBackend;

let device = RenderingDevice::new(Box::new(SoftBackend::default()), DeviceConfig::default())?;
assert_eq!(device.get_device_name(), "Galaxy3D Software Device");
# Ok::<(), galaxy_3d_rendering_device::galaxy3d::Error>(())
```
*/

mod soft_backend;
mod soft_shader;
mod soft_spirv;
mod soft_texture;

pub use soft_backend::{SoftBackend, SoftBackendConfig, SoftStats};
pub use soft_spirv::{SpirvDescriptor, SpirvModuleBuilder};
