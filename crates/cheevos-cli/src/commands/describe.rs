use anyhow::{Result, bail};
use cheevos::{ErrorCode, describe};

pub fn run(code: i32) -> Result<()> {
    let Some(code) = ErrorCode::from_i32(code) else {
        bail!("Unknown error code: {}", code);
    };
    println!("{} ({}): {}", code as i32, code, describe(code));
    Ok(())
}
