use log::{info, warn};
use snafu::{ResultExt, Snafu};
use std::{
    path::{Path, PathBuf},
    process::Command,
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Invalid shader glob pattern '{}': {}", pattern, source))]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[snafu(display("Failed to read shader path: {}", source))]
    ReadShaderPath { source: glob::GlobError },

    #[snafu(display("Failed to run the shader compiler on '{}': {}", path.display(), source))]
    RunCompiler {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Shader compiler rejected '{}':\n{}", path.display(), output))]
    CompileShader { path: PathBuf, output: String },
}

pub const SHADER_COMPILER: &str = "glslangValidator";

const SHADER_STAGE_EXTENSIONS: [&str; 6] = ["vert", "frag", "geom", "comp", "tesc", "tese"];

/// Compiles every GLSL stage file matched by `pattern` into a sibling `.spv` file.
pub fn compile_shaders(pattern: &str) -> Result<()> {
    for entry in glob::glob(pattern).context(InvalidPattern { pattern })? {
        let path = entry.context(ReadShaderPath)?;
        if !is_shader_source(&path) {
            continue;
        }
        compile_shader(&path)?;
    }
    Ok(())
}

pub fn compile_shader(path: &Path) -> Result<()> {
    let output_path = spirv_output_path(path);
    info!("Compiling {} -> {}", path.display(), output_path.display());

    let output = Command::new(SHADER_COMPILER)
        .arg("-V")
        .arg(path)
        .arg("-o")
        .arg(&output_path)
        .output()
        .context(RunCompiler { path })?;

    if !output.status.success() {
        let output = String::from_utf8_lossy(&output.stdout).into_owned();
        warn!("{}", output);
        return CompileShader { path, output }.fail();
    }

    Ok(())
}

pub fn is_shader_source(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map_or(false, |extension| {
            SHADER_STAGE_EXTENSIONS.contains(&extension)
        })
}

/// `toon.vert` compiles to `toon.vert.spv`.
pub fn spirv_output_path(path: &Path) -> PathBuf {
    let mut file_name = path.as_os_str().to_owned();
    file_name.push(".spv");
    PathBuf::from(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_keeps_stage_extension() {
        let path = Path::new("assets/shaders/debugmarker/toon.vert");
        assert_eq!(
            spirv_output_path(path),
            PathBuf::from("assets/shaders/debugmarker/toon.vert.spv")
        );
    }

    #[test]
    fn only_stage_files_are_compiled() {
        assert!(is_shader_source(Path::new("shaders/toon.frag")));
        assert!(is_shader_source(Path::new("shaders/postprocess.vert")));
        assert!(!is_shader_source(Path::new("shaders/toon.frag.spv")));
        assert!(!is_shader_source(Path::new("shaders/README.md")));
        assert!(!is_shader_source(Path::new("shaders/common")));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let result = compile_shaders("assets/[");
        assert!(matches!(result, Err(Error::InvalidPattern { .. })));
    }
}
