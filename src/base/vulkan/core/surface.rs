use ash::{extensions::khr, prelude::VkResult, vk, Entry};
use raw_window_handle::{HasRawWindowHandle, RawWindowHandle};
use snafu::{ResultExt, Snafu};
use std::ffi::CStr;
use winit::window::Window;

#[cfg(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
use ash::extensions::khr::{WaylandSurface, XcbSurface, XlibSurface};

#[cfg(target_os = "windows")]
use ash::extensions::khr::Win32Surface;

#[cfg(target_os = "android")]
use ash::extensions::khr::AndroidSurface;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to create window surface: {}", source))]
    CreateSurface { source: ash::vk::Result },

    #[snafu(display("Unsupported window handle for surface creation: {}", handle))]
    UnsupportedWindowHandle { handle: String },
}

#[cfg(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
pub fn surface_extension_names() -> Vec<&'static CStr> {
    vec![
        XlibSurface::name(),
        XcbSurface::name(),
        WaylandSurface::name(),
    ]
}

#[cfg(target_os = "windows")]
pub fn surface_extension_names() -> Vec<&'static CStr> {
    vec![Win32Surface::name()]
}

#[cfg(target_os = "android")]
pub fn surface_extension_names() -> Vec<&'static CStr> {
    vec![AndroidSurface::name()]
}

pub struct Surface {
    surface: khr::Surface,
    surface_khr: vk::SurfaceKHR,
}

impl Surface {
    pub fn new(entry: &Entry, instance: &ash::Instance, window: &Window) -> Result<Self> {
        let surface_khr = unsafe { create_platform_surface(entry, instance, window) }?;
        let surface = khr::Surface::new(entry, instance);
        Ok(Self {
            surface,
            surface_khr,
        })
    }

    pub fn surface(&self) -> &khr::Surface {
        &self.surface
    }

    pub fn surface_khr(&self) -> vk::SurfaceKHR {
        self.surface_khr
    }

    pub fn supports_presentation(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
    ) -> VkResult<bool> {
        unsafe {
            self.surface.get_physical_device_surface_support(
                physical_device,
                queue_family_index,
                self.surface_khr,
            )
        }
    }

    pub fn capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface
                .get_physical_device_surface_capabilities(physical_device, self.surface_khr)
        }
    }

    pub fn formats(&self, physical_device: vk::PhysicalDevice) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.surface
                .get_physical_device_surface_formats(physical_device, self.surface_khr)
        }
    }

    pub fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.surface
                .get_physical_device_surface_present_modes(physical_device, self.surface_khr)
        }
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe {
            self.surface.destroy_surface(self.surface_khr, None);
        }
    }
}

#[cfg(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
unsafe fn create_platform_surface(
    entry: &Entry,
    instance: &ash::Instance,
    window: &Window,
) -> Result<vk::SurfaceKHR> {
    match window.raw_window_handle() {
        RawWindowHandle::Xlib(handle) => {
            let create_info = vk::XlibSurfaceCreateInfoKHR::builder()
                .window(handle.window as vk::Window)
                .dpy(handle.display as *mut vk::Display);
            XlibSurface::new(entry, instance)
                .create_xlib_surface(&create_info, None)
                .context(CreateSurface)
        }
        RawWindowHandle::Xcb(handle) => {
            let create_info = vk::XcbSurfaceCreateInfoKHR::builder()
                .connection(handle.connection as *mut _)
                .window(handle.window as _);
            XcbSurface::new(entry, instance)
                .create_xcb_surface(&create_info, None)
                .context(CreateSurface)
        }
        RawWindowHandle::Wayland(handle) => {
            let create_info = vk::WaylandSurfaceCreateInfoKHR::builder()
                .display(handle.display as *mut _)
                .surface(handle.surface as *mut _);
            WaylandSurface::new(entry, instance)
                .create_wayland_surface(&create_info, None)
                .context(CreateSurface)
        }
        handle => UnsupportedWindowHandle {
            handle: format!("{:?}", handle),
        }
        .fail(),
    }
}

#[cfg(target_os = "windows")]
unsafe fn create_platform_surface(
    entry: &Entry,
    instance: &ash::Instance,
    window: &Window,
) -> Result<vk::SurfaceKHR> {
    use std::{os::raw::c_void, ptr};
    use winapi::um::libloaderapi::GetModuleHandleW;

    match window.raw_window_handle() {
        RawWindowHandle::Windows(handle) => {
            let hinstance = GetModuleHandleW(ptr::null()) as *const c_void;
            let create_info = vk::Win32SurfaceCreateInfoKHR::builder()
                .hinstance(hinstance)
                .hwnd(handle.hwnd as *const c_void);
            Win32Surface::new(entry, instance)
                .create_win32_surface(&create_info, None)
                .context(CreateSurface)
        }
        handle => UnsupportedWindowHandle {
            handle: format!("{:?}", handle),
        }
        .fail(),
    }
}

#[cfg(target_os = "android")]
unsafe fn create_platform_surface(
    entry: &Entry,
    instance: &ash::Instance,
    window: &Window,
) -> Result<vk::SurfaceKHR> {
    match window.raw_window_handle() {
        RawWindowHandle::Android(handle) => {
            let create_info =
                vk::AndroidSurfaceCreateInfoKHR::builder().window(handle.a_native_window as *mut _);
            AndroidSurface::new(entry, instance)
                .create_android_surface(&create_info, None)
                .context(CreateSurface)
        }
        handle => UnsupportedWindowHandle {
            handle: format!("{:?}", handle),
        }
        .fail(),
    }
}
