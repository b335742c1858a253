use proxyprobe::entry;
use proxyprobe::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
