use super::status::format_status;
use super::{absolute, Session, SourceArgs};
use crate::emit::{self, EmitOptions};
use crate::error::Result;
use crate::linker::{PlannedLinker, SymlinkLinker};
use crate::pnp::LocationIndex;
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub out: Option<String>,
    pub template: Option<String>,
    pub shebang: Option<String>,
    pub dry_run: bool,
}

pub fn cmd_generate(source: &SourceArgs, options: GenerateOptions) -> Result<()> {
    let session = Session::open(source)?;
    let mut config = session.config.clone();
    if let Some(out) = &options.out {
        config.output = absolute(out)?;
    }
    if let Some(template) = &options.template {
        config.template = Some(absolute(template)?);
    }
    if options.shebang.is_some() {
        config.shebang = options.shebang.clone();
    }

    // a bad template must fail before any alias lands on disk
    let template = config.load_template(&session.root)?;
    emit::ensure_marker(&template)?;

    let start = Instant::now();
    println!(
        "{}",
        format_status("resolving", &format!("{} seed dependencies", session.manifest.seed_patterns().len()))
    );
    let store = if options.dry_run {
        let linker = PlannedLinker::new(session.externals());
        let store = session.build(&linker)?;
        for (alias, real) in linker.planned() {
            println!("{}", format_status("dry-run", &format!("would link {alias} -> {real}")));
        }
        store
    } else {
        let linker = SymlinkLinker::new(session.externals());
        session.build(&linker)?
    };
    let index = LocationIndex::from_store(&store);
    let rendered = emit::render(&template, &store, &index, &EmitOptions { shebang: config.shebang.clone() })?;

    let out = config.output_path(&session.root);
    if options.dry_run {
        println!(
            "{}",
            format_status("dry-run", &format!("would write {out} ({} bytes)", rendered.len()))
        );
        return Ok(());
    }
    emit::write_artifact(&out, &rendered, config.shebang.is_some())?;
    println!(
        "{}",
        format_status(
            "wrote",
            &format!(
                "{out} ({} packages, {} locations) in {:.2?}",
                store.len(),
                index.len(),
                start.elapsed()
            )
        )
    );
    Ok(())
}
