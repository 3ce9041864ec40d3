use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("ncvideo {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: ncvideo");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", option_env!("NCVIDEO_BUILD_TARGET").unwrap_or("unknown"));
    println!("profile: {}", option_env!("NCVIDEO_BUILD_PROFILE").unwrap_or("unknown"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "protocol: magic=NQ max_message={} header_page={}",
        ncvideo_queue::DEFAULT_MAX_MESSAGE_LEN,
        ncvideo_sdk::HEADER_PAGE_SIZE
    );

    Ok(SUCCESS)
}
