fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(feature = "grpc")]
    {
        const PROTO: &str = "proto/auth.proto";
        println!("cargo:rerun-if-changed={PROTO}");

        // Both halves: the server binary serves `Auth`, the client binary and
        // integration tests call it.
        tonic_build::configure()
            .build_server(true)
            .build_client(true)
            .emit_rerun_if_changed(false)
            .compile(&[PROTO], &["proto"])?;
    }

    Ok(())
}
