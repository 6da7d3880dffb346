use servoprobe::frame::ServoCommand;
use servoprobe::sequence::{StepReport, StepStatus};

use crate::cmd::{Context, SendArgs};
use crate::exit::{frame_error, session_error, CliResult, SUCCESS};
use crate::output::print_step;

pub fn run(args: SendArgs, ctx: &Context) -> CliResult<i32> {
    // Reject bad parameters before the port is touched.
    let command = ServoCommand::new(args.servo_id, args.angle)
        .map_err(|err| frame_error("send failed", err))?;
    let timeout = ctx.link.response_timeout()?;

    let Some(mut session) = ctx.open_session()? else {
        return Ok(SUCCESS);
    };
    session
        .send(&command)
        .map_err(|err| session_error("send failed", err))?;

    let mut step = StepReport {
        label: "send".to_string(),
        command: command.to_string(),
        status: StepStatus::Sent,
        response: None,
        error: None,
    };

    if args.wait {
        let response = session
            .read_response(timeout)
            .map_err(|err| session_error("receive failed", err))?;
        step.status = if response.is_empty() {
            StepStatus::NoResponse
        } else if response.is_rejection() {
            StepStatus::DeviceRejected
        } else {
            StepStatus::Responded
        };
        if !response.is_empty() {
            step.response = Some(response.into_string());
        }
    }

    print_step(&step, ctx.format);
    Ok(SUCCESS)
}
