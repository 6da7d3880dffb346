use servoprobe::sequence::SequenceRunner;
use servoprobe::SequenceConfig;

use crate::cmd::Context;
use crate::exit::{CliResult, FAILURE, SUCCESS};
use crate::output::print_step;

pub fn run(ctx: &Context) -> CliResult<i32> {
    let Some(mut session) = ctx.open_session()? else {
        return Ok(SUCCESS);
    };
    let config = SequenceConfig::default();
    let timeout = config.single_timeout;

    let mut runner = SequenceRunner::new(&mut session, config, ctx.cancel.clone());
    let step = runner.exchange(0, 90.0, timeout);
    print_step(&step, ctx.format);

    if step.status.is_failure() {
        return Ok(FAILURE);
    }
    Ok(SUCCESS)
}
