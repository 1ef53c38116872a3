use crate::vulkan::VulkanContext;
use ash::{version::DeviceV1_0, vk};
use log::debug;
use snafu::{ResultExt, Snafu};
use std::{
    ffi::CStr,
    path::{Path, PathBuf},
    sync::Arc,
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to find shader file path '{}': {}", path.display(), source))]
    FindShaderFilePath {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to read SPIR-V shader source from bytes: {}", source))]
    ReadShaderSourceBytes { source: std::io::Error },

    #[snafu(display("Failed to create shader module: {}", source))]
    CreateShaderModule { source: ash::vk::Result },
}

pub fn shader_entry_point_name() -> &'static CStr {
    unsafe { CStr::from_bytes_with_nul_unchecked(b"main\0") }
}

pub struct Shader {
    context: Arc<VulkanContext>,
    path: PathBuf,
    module: vk::ShaderModule,
    state_info: vk::PipelineShaderStageCreateInfo,
}

impl Shader {
    pub fn from_file(
        context: Arc<VulkanContext>,
        path: impl AsRef<Path>,
        stage: vk::ShaderStageFlags,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut shader_file =
            std::fs::File::open(&path).context(FindShaderFilePath { path: path.clone() })?;
        let shader_source = ash::util::read_spv(&mut shader_file).context(ReadShaderSourceBytes)?;
        let shader_create_info = vk::ShaderModuleCreateInfo::builder()
            .code(&shader_source)
            .build();
        let module = unsafe {
            context
                .logical_device()
                .logical_device()
                .create_shader_module(&shader_create_info, None)
                .context(CreateShaderModule)?
        };

        let state_info = vk::PipelineShaderStageCreateInfo::builder()
            .stage(stage)
            .module(module)
            .name(shader_entry_point_name())
            .build();

        let shader = Shader {
            module,
            path,
            context,
            state_info,
        };

        Ok(shader)
    }

    pub fn module(&self) -> vk::ShaderModule {
        self.module
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state_info(&self) -> vk::PipelineShaderStageCreateInfo {
        self.state_info
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.context
                .logical_device()
                .logical_device()
                .destroy_shader_module(self.module, None);
        }
    }
}

/// Keeps every shader module alive until the cache is dropped or cleared.
pub struct ShaderCache {
    shaders: Vec<Shader>,
    context: Arc<VulkanContext>,
}

impl ShaderCache {
    pub fn new(context: Arc<VulkanContext>) -> Self {
        Self {
            shaders: Vec::new(),
            context,
        }
    }

    /// Loads a shader once per path and stage, returning its stage info.
    pub fn load(
        &mut self,
        path: impl AsRef<Path>,
        stage: vk::ShaderStageFlags,
    ) -> Result<vk::PipelineShaderStageCreateInfo> {
        if let Some(shader) = self.find(path.as_ref(), stage) {
            return Ok(shader.state_info());
        }

        debug!("Loading shader '{}'", path.as_ref().display());
        let shader = Shader::from_file(self.context.clone(), path, stage)?;
        let state_info = shader.state_info();
        self.shaders.push(shader);
        Ok(state_info)
    }

    pub fn find(&self, path: &Path, stage: vk::ShaderStageFlags) -> Option<&Shader> {
        self.shaders
            .iter()
            .find(|shader| shader.path() == path && shader.state_info().stage == stage)
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    pub fn clear(&mut self) {
        self.shaders.clear();
    }
}
