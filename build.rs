fn main() -> Result<(), Box<dyn std::error::Error>> {
    // protox compiles the descriptors in-process, so builds don't need a system protoc.
    let file_descriptors = protox::compile(
        ["proto/common.proto", "proto/admin.proto", "proto/warden.proto"],
        ["proto"],
    )?;

    tonic_build::configure().compile_fds(file_descriptors)?;
    Ok(())
}
