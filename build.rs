fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::env::var("OUT_DIR")?;

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(std::path::PathBuf::from(&out_dir).join("logi_descriptor.bin"))
        .out_dir("src/proto")
        .compile_protos(
            &[
                "proto/common.proto",
                "proto/health.proto",
                "proto/auth.proto",
                "proto/tenant.proto",
                "proto/customer.proto",
                "proto/vehicle.proto",
                "proto/policy.proto",
                "proto/permit.proto",
                "proto/compliance.proto",
                "proto/dynamic_field.proto",
                "proto/report.proto",
                "proto/notification.proto",
            ],
            &["proto"],
        )?;

    println!("cargo:rerun-if-changed=proto/");

    Ok(())
}
