// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_root = "proto";
    let protos = [
        "zorro/tools.proto",
        "zorro/processor.proto",
        "zorro/scheduling.proto",
        "zorro_testing/socket_value.proto",
        "zorro_testing/log.proto",
    ];

    // The encoded descriptor set backs the reflection service of the test workers
    let descriptor_path = PathBuf::from(env::var("OUT_DIR")?).join("zorro_descriptor.bin");

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(&descriptor_path)
        .out_dir("src/proto") // generated Rust goes here
        .compile(
            &protos.map(|proto| format!("{proto_root}/{proto}")),
            &[proto_root],
        )?;

    for proto in protos {
        println!("cargo:rerun-if-changed={proto_root}/{proto}");
    }
    Ok(())
}
