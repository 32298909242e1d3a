//! Build script for compiling protobuf definitions into Rust code

#[cfg(feature = "grpc-server")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::path::PathBuf;

    if std::env::var_os("PROTOC").is_none() {
        if let Ok(protoc) = protoc_bin_vendored::protoc_bin_path() {
            std::env::set_var("PROTOC", protoc);
        }
    }

    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    tonic_build::configure()
        .file_descriptor_set_path(out_dir.join("encryption_descriptor.bin"))
        .compile(&["proto/encryption.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/encryption.proto");
    Ok(())
}

#[cfg(not(feature = "grpc-server"))]
fn main() {
    // No-op when grpc-server feature is not enabled
}
