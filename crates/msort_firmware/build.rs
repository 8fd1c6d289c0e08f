/// Build script for the bare-metal firmware.
///
/// Passes the linker script to the final link when building for a
/// freestanding RISC-V target. Host builds produce a stub binary and need no
/// linker script.
use std::env;
use std::path::PathBuf;

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());

    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("none") {
        println!(
            "cargo:rustc-link-arg-bins=-T{}",
            manifest_dir.join("link.ld").display()
        );
    }

    println!("cargo:rerun-if-changed=link.ld");
    println!("cargo:rerun-if-changed=src/entry.S");
}
