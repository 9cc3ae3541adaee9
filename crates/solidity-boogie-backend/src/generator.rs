// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use crate::{
    boogie_backend::boogie_wrapper::BoogieWrapper,
    context::BoogieContext,
    diagnostics::{DiagnosticKind, Diagnostics, SourceFiles},
    options::BoogieOptions,
    translation::{translate_model, DocTagResolver},
};
use anyhow::{anyhow, Context};
use boogie_ast::Program;
use codespan_reporting::{
    diagnostic::Severity,
    term::termcolor::{ColorChoice, StandardStream, WriteColor},
};
use log::{debug, info};
use solidity_ast::SourceModel;
use std::{fs, path::Path, time::Instant};

/// The translated program together with everything reported while producing it
pub struct TranslationOutput {
    pub program: Program,
    pub diagnostics: Diagnostics,
}

/// Translates all contracts of `model`. Unsupported constructs end up in the diagnostics, only
/// violated assumptions about the AST make this fail.
pub fn translate(
    model: &SourceModel,
    options: &BoogieOptions,
    resolver: &dyn DocTagResolver,
) -> anyhow::Result<TranslationOutput> {
    let mut ctx = BoogieContext::new(model, options);
    if let Some(path) = &options.prelude_path {
        let prelude = fs::read_to_string(path)
            .with_context(|| format!("reading prelude `{}`", path))?;
        ctx.set_prelude(prelude);
    }
    translate_model(&mut ctx, resolver)?;
    let (program, diagnostics) = ctx.into_parts();
    debug!(
        "{} declarations, {} errors, {} warnings",
        program.decls().len(),
        diagnostics.error_count(),
        diagnostics.warning_count()
    );
    Ok(TranslationOutput {
        program,
        diagnostics,
    })
}

pub fn run_boogie_gen(
    model: &SourceModel,
    sources: &SourceFiles,
    options: &BoogieOptions,
    resolver: &dyn DocTagResolver,
) -> anyhow::Result<String> {
    let mut error_writer = StandardStream::stderr(ColorChoice::Auto);

    run_solc_verify_with_model(model, sources, &mut error_writer, options, resolver, None)
}

/// Translates `model`, writes the program and, unless only generation is requested, verifies
/// it. Returns a summary of the outcome.
pub fn run_solc_verify_with_model<W: WriteColor>(
    model: &SourceModel,
    sources: &SourceFiles,
    error_writer: &mut W,
    options: &BoogieOptions,
    resolver: &dyn DocTagResolver,
    timer: Option<Instant>,
) -> anyhow::Result<String> {
    let now = timer.unwrap_or_else(Instant::now);
    let TranslationOutput {
        program,
        mut diagnostics,
    } = translate(model, options, resolver)?;
    let trafo_duration = now.elapsed();

    // the program stays available for inspection even when it cannot be trusted
    write_boogie(&program, &options.output_path)?;
    check_errors(
        &diagnostics,
        sources,
        error_writer,
        "exiting with translation errors",
    )?;

    if options.generate_only {
        info!("{:.3}s translation", trafo_duration.as_secs_f64());
        return Ok(format!("Boogie program written to `{}`", options.output_path));
    }

    let now = Instant::now();
    let mut verification = Diagnostics::new();
    verify_boogie(options, &mut verification)?;
    let verify_duration = now.elapsed();
    info!(
        "{:.3}s translation, {:.3}s verification",
        trafo_duration.as_secs_f64(),
        verify_duration.as_secs_f64()
    );

    diagnostics.extend(verification);
    let errors = diagnostics.errors_of_kind(DiagnosticKind::Verification).count();
    if errors > 0 {
        diagnostics.render(error_writer, sources, Severity::Error)?;
        return Err(anyhow!("exiting with verification errors"));
    }
    Ok("Verification successful".to_string())
}

pub fn check_errors<W: WriteColor>(
    diagnostics: &Diagnostics,
    sources: &SourceFiles,
    error_writer: &mut W,
    msg: &'static str,
) -> anyhow::Result<()> {
    diagnostics.render(error_writer, sources, Severity::Warning)?;
    if diagnostics.has_errors() {
        Err(anyhow!(msg))
    } else {
        Ok(())
    }
}

pub fn write_boogie(program: &Program, file_name: &str) -> anyhow::Result<()> {
    debug!("writing boogie to `{}`", file_name);
    if let Some(dir) = Path::new(file_name).parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    fs::write(file_name, program.to_string())
        .with_context(|| format!("writing `{}`", file_name))
}

/// Runs boogie on the written program and collects the errors it reports.
pub fn verify_boogie(options: &BoogieOptions, diagnostics: &mut Diagnostics) -> anyhow::Result<()> {
    let boogie = BoogieWrapper { options };
    boogie.call_boogie_and_verify_output(&options.output_path, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::EmbeddedDocTags;
    use codespan_reporting::term::termcolor::Buffer;
    use solidity_ast::{AstBuilder, ContractNode, SolType, StatementKind};

    fn model_with(statements: Vec<StatementKind>) -> SourceModel {
        let mut b = AstBuilder::new("A.sol");
        let stmts = statements.into_iter().map(|kind| b.stmt(kind)).collect();
        let body = b.block(stmts);
        let f = b.function("f", vec![], vec![], body);
        let x = b.state_var("x", SolType::uint(8));
        let contract = b.contract(
            "A",
            vec![ContractNode::StateVariable(x), ContractNode::Function(f)],
        );
        SourceModel::new(vec![b.source_unit(vec![contract])])
    }

    #[test]
    fn writes_program_in_generate_only_mode() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("A.bpl");
        let options = BoogieOptions {
            output_path: output.to_string_lossy().to_string(),
            ..Default::default()
        };
        let model = model_with(vec![]);
        let mut buffer = Buffer::no_color();
        let summary = run_solc_verify_with_model(
            &model,
            &SourceFiles::new(),
            &mut buffer,
            &options,
            &EmbeddedDocTags,
            None,
        )
        .unwrap();
        assert!(summary.starts_with("Boogie program written to"));
        let text = fs::read_to_string(&output).unwrap();
        assert!(text.contains("type address_t;"));
        assert!(text.contains("procedure {:sourceloc \"A.sol\", 1, 1} {:message \"A::f\"} f#"));
    }

    #[test]
    fn translation_errors_stop_before_verification() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("A.bpl");
        let options = BoogieOptions {
            output_path: output.to_string_lossy().to_string(),
            generate_only: false,
            boogie_exe: "/nonexistent/boogie".to_string(),
            ..Default::default()
        };
        let model = model_with(vec![StatementKind::InlineAssembly]);
        let mut buffer = Buffer::no_color();
        let err = run_solc_verify_with_model(
            &model,
            &SourceFiles::new(),
            &mut buffer,
            &options,
            &EmbeddedDocTags,
            None,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "exiting with translation errors");
        // still written for inspection
        assert!(output.exists());
        let rendered = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(rendered.contains("error: Inline assembly is not supported"));
    }

    #[test]
    fn missing_prelude_file_is_reported() {
        let options = BoogieOptions {
            prelude_path: Some("/nonexistent/prelude.bpl".to_string()),
            ..Default::default()
        };
        let err = translate(&model_with(vec![]), &options, &EmbeddedDocTags)
            .err()
            .unwrap();
        assert!(err.to_string().contains("reading prelude"));
    }
}
