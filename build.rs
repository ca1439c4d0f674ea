use std::{env, error::Error};

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rustc-check-cfg=cfg(tag_bits_free)");

    let arch = env::var("CARGO_CFG_TARGET_ARCH")?;
    let width = env::var("CARGO_CFG_TARGET_POINTER_WIDTH")?;

    // The packed (pointer, tag) word needs the high 16 bits of every pointer
    // to be zero: true of any 32-bit target, and of the canonical user-space
    // address layouts on x86-64 and AArch64.
    match (&*width, &*arch) {
        ("32", _) | (_, "x86_64") | (_, "aarch64") => {
            println!("cargo:rustc-cfg=tag_bits_free")
        }
        _ => {}
    }

    Ok(())
}
