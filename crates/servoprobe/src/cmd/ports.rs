use servoprobe::transport::{list_ports, PortMatcher};

use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_ports, OutputFormat};

pub fn run(format: OutputFormat) -> CliResult<i32> {
    let ports = list_ports().map_err(|err| transport_error("port enumeration failed", err))?;
    print_ports(&ports, &PortMatcher::default(), format);
    Ok(SUCCESS)
}
