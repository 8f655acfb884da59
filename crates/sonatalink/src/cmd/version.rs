use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("sonatalink {}", env!("CARGO_PKG_VERSION"));
    if !args.extended {
        return Ok(SUCCESS);
    }

    println!(
        "target: {}",
        option_env!("SONATALINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("os: {}", std::env::consts::OS);
    println!("arch: {}", std::env::consts::ARCH);
    println!(
        "byte_order: {}",
        if cfg!(target_endian = "little") {
            "little-endian (swapping)"
        } else {
            "big-endian (native)"
        }
    );
    println!(
        "channelizer_interface: {}",
        sonatalink_marshal::channelizer::INTERFACE_VERSION
    );
    println!("dx_interface: {}", sonatalink_marshal::dx::INTERFACE_VERSION);
    println!(
        "wire_fingerprint: {:016x}",
        sonatalink_marshal::fingerprint()
    );
    Ok(SUCCESS)
}
