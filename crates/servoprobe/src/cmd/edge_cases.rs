use servoprobe::sequence::SequenceRunner;
use servoprobe::SequenceConfig;

use crate::cmd::sweep::finish;
use crate::cmd::Context;
use crate::exit::{CliResult, SUCCESS};

pub fn run(ctx: &Context) -> CliResult<i32> {
    let config = SequenceConfig {
        response_timeout: ctx.link.response_timeout()?,
        ..SequenceConfig::default()
    };

    let Some(mut session) = ctx.open_session()? else {
        return Ok(SUCCESS);
    };
    let mut runner = SequenceRunner::new(&mut session, config, ctx.cancel.clone());
    let report = runner.edge_cases();
    Ok(finish(&report, ctx))
}
