/// Builds the gRPC client and server code for the `todo.proto` definition using
/// `tonic-prost-build`.
///
/// Every message in the `todo.v1` package additionally derives
/// `serde::Serialize`/`serde::Deserialize` with container-level
/// `#[serde(default)]`, so the HTTP gateway and contract fixtures can decode
/// partial JSON bodies into the same types the gRPC service consumes.
///
/// # Files and Paths
///
/// - Proto file: `proto/todo.proto`
/// - Includes: `proto/`
/// - Descriptor set: `$OUT_DIR/todo_descriptor.bin` (used by reflection)
///
/// # Panics
///
/// This function will `panic!` if code generation fails.
use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("todo_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();

    config
        .type_attribute(
            ".todo.v1",
            "#[derive(serde::Serialize, serde::Deserialize)]",
        )
        .type_attribute(".todo.v1", "#[serde(default)]")
        .file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/todo.proto"], &["proto"])
        .unwrap();

    println!("cargo:rerun-if-changed=proto/todo.proto");
}
