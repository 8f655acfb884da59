use sonatalink_marshal::{check_all_layouts, registry, selfcheck, Layout};

use crate::cmd::LayoutArgs;
use crate::exit::{integrity_error, CliError, CliResult, SUCCESS};
use crate::output::{print_layout_fields, print_layouts, OutputFormat};

pub fn run(args: LayoutArgs, format: OutputFormat) -> CliResult<i32> {
    let summary = if args.check {
        Some(check_all_layouts().map_err(|err| integrity_error("layout check failed", err))?)
    } else {
        None
    };

    if let Some(name) = &args.record {
        let info = selfcheck::find(name)
            .ok_or_else(|| CliError::usage(format!("unknown record {name:?}")))?;
        print_layout_fields(info.layout, format);
        return Ok(SUCCESS);
    }

    let layouts: Vec<&Layout> = registry().iter().map(|info| info.layout).collect();
    print_layouts(&layouts, summary.as_ref(), format);
    Ok(SUCCESS)
}
