use anyhow::{Context, Result, anyhow};
use jaq_core::{Compiler, Ctx, RcIter, compile::Undefined, load};
use jaq_json::Val;
use serde_json::Value;

/// Run a jq filter over one document; every output becomes its own document.
pub fn run_filter(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader
        .load(&arena, program)
        .map_err(format_parse_errors)?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(format_undefined_errors)?;

    let inputs = RcIter::new(core::iter::empty());
    let outputs = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut out = Vec::new();
    for output in outputs {
        let val = output.map_err(|e| anyhow!("jq filter failed: {e:?}"))?;
        // Val renders as JSON text.
        let text = val.to_string();
        let doc = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("jq produced non-JSON output: {text}"))?;
        out.push(doc);
    }
    Ok(out)
}

fn format_parse_errors(errs: Vec<(load::File<&str, ()>, load::Error<&str>)>) -> anyhow::Error {
    let report: Vec<String> = errs
        .into_iter()
        .map(|(file, err)| format!("cannot parse jq filter `{}`: {err:?}", file.code))
        .collect();
    anyhow!(report.join("\n"))
}

fn format_undefined_errors(
    errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>,
) -> anyhow::Error {
    let report: Vec<String> = errs
        .into_iter()
        .flat_map(|(file, undefined)| {
            undefined
                .into_iter()
                .map(move |(name, what)| format!("jq filter `{}` uses undefined {what:?} `{name}`", file.code))
        })
        .collect();
    anyhow!(report.join("\n"))
}
