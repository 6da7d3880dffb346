use servoprobe::sequence::SequenceRunner;
use servoprobe::SequenceConfig;

use crate::cmd::sweep::{check_servo_id, finish};
use crate::cmd::{parse_duration, Context, RateArgs};
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: RateArgs, ctx: &Context) -> CliResult<i32> {
    check_servo_id(args.servo_id)?;
    let interval = parse_duration(&args.interval)?;

    let Some(mut session) = ctx.open_session()? else {
        return Ok(SUCCESS);
    };
    let mut runner =
        SequenceRunner::new(&mut session, SequenceConfig::default(), ctx.cancel.clone());
    let report = runner.command_rate(args.servo_id, args.count, interval);
    Ok(finish(&report, ctx))
}
