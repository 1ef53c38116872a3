use log::{warn, LevelFilter};
use shader_compilation::compile_shaders;
use simplelog::{Config, SimpleLogger};

fn main() {
    let _ = SimpleLogger::init(LevelFilter::Info, Config::default());

    let shader_directory = "assets/shaders";
    println!("cargo:rerun-if-changed={}", shader_directory);

    let shader_glob = shader_directory.to_owned() + "/**/*";
    if let Err(error) = compile_shaders(&shader_glob) {
        warn!("Failed to recompile shaders: {}", error);
        println!("cargo:warning=Failed to recompile shaders: {}", error);
    }
}
