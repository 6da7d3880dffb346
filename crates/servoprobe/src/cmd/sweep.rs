use servoprobe::frame::{is_valid_servo_id, MAX_SERVO_ID, MIN_SERVO_ID};
use servoprobe::sequence::{SequenceReport, SequenceRunner};
use servoprobe::SequenceConfig;

use crate::cmd::{parse_duration, AllArgs, Context, SweepArgs};
use crate::exit::{CliError, CliResult, DATA_INVALID, FAILURE, SUCCESS, USAGE};
use crate::output::print_report;

pub fn run(args: SweepArgs, ctx: &Context) -> CliResult<i32> {
    check_servo_id(args.servo_id)?;
    if args.angles.is_empty() {
        return Err(CliError::new(USAGE, "--angles must name at least one angle"));
    }
    let config = SequenceConfig {
        range_wait: parse_duration(&args.interval)?,
        response_timeout: ctx.link.response_timeout()?,
        ..SequenceConfig::default()
    };

    let Some(mut session) = ctx.open_session()? else {
        return Ok(SUCCESS);
    };
    let mut runner = SequenceRunner::new(&mut session, config, ctx.cancel.clone());
    let report = runner.servo_range(args.servo_id, &args.angles);
    Ok(finish(&report, ctx))
}

pub fn run_all(args: AllArgs, ctx: &Context) -> CliResult<i32> {
    let config = SequenceConfig {
        sweep_wait: parse_duration(&args.interval)?,
        ..SequenceConfig::default()
    };

    let Some(mut session) = ctx.open_session()? else {
        return Ok(SUCCESS);
    };
    let mut runner = SequenceRunner::new(&mut session, config, ctx.cancel.clone());
    let report = runner.all_servos(args.angle);
    Ok(finish(&report, ctx))
}

pub(crate) fn check_servo_id(servo_id: i64) -> CliResult<()> {
    if is_valid_servo_id(servo_id) {
        return Ok(());
    }
    Err(CliError::new(
        DATA_INVALID,
        format!("invalid servo ID: {servo_id} (must be {MIN_SERVO_ID}-{MAX_SERVO_ID})"),
    ))
}

pub(crate) fn finish(report: &SequenceReport, ctx: &Context) -> i32 {
    print_report(report, ctx.format);
    if report.has_failures() {
        FAILURE
    } else {
        SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn servo_id_outside_range_is_data_invalid() {
        assert!(check_servo_id(0).is_ok());
        assert!(check_servo_id(6).is_ok());
        let err = check_servo_id(7).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
        assert_eq!(err.message, "invalid servo ID: 7 (must be 0-6)");
    }
}
