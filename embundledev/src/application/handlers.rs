use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use embundle_core::error::Result;
use embundle_core::{
    BundleFs, BundleOptions, Embedding, IndexOptions, ListOptions, ObjcopyInjector,
    bundle_with_injector, extract, has_bundle, list, unbundle_with,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::presentation::cli::EmbedArg;

fn open_from(file: Option<PathBuf>, strict: bool) -> Result<BundleFs> {
    let path = match file {
        Some(p) => p,
        None => std::env::current_exe()?,
    };
    unbundle_with(&path, &IndexOptions { strict })
}

fn created_display(secs: i64) -> String {
    OffsetDateTime::from_unix_timestamp(secs)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| secs.to_string())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_bundle(
    source: PathBuf,
    out: PathBuf,
    description: String,
    embed: EmbedArg,
    host: Option<PathBuf>,
    section_name: Option<String>,
    deterministic: bool,
    objcopy: PathBuf,
) -> Result<ExitCode> {
    let opts = BundleOptions {
        embedding: match embed {
            EmbedArg::Trailer => Embedding::Trailer,
            EmbedArg::Section => Embedding::Section,
        },
        host,
        deterministic,
        section_name,
    };
    let injector = ObjcopyInjector { program: objcopy };
    let report = bundle_with_injector(&source, &out, &description, &opts, &injector)?;
    eprintln!(
        "bundle: wrote {} ({} entries, {} bytes)",
        out.display(),
        report.entries,
        report.container_len
    );
    Ok(ExitCode::SUCCESS)
}

pub fn handle_unbundle(dest: PathBuf, file: Option<PathBuf>, strict: bool) -> Result<ExitCode> {
    let fs = open_from(file, strict)?;
    eprintln!("Extracting \"{}\" to {}", fs.header().description, dest.display());
    let n = extract(&fs, &dest)?;
    eprintln!("unbundle: {n} files");
    Ok(ExitCode::SUCCESS)
}

pub fn handle_info(file: Option<PathBuf>, json: bool, strict: bool) -> Result<ExitCode> {
    let fs = open_from(file, strict)?;
    let h = fs.header();
    if json {
        let v = serde_json::json!({
            "host": fs.host(),
            "locator": format!("{:?}", fs.locator()),
            "header": h,
            "entries": fs.len(),
        });
        println!("{v:#}");
    } else {
        println!("host:        {}", fs.host().display());
        println!("locator:     {:?}", fs.locator());
        println!("description: {}", h.description);
        println!("created:     {}", created_display(h.created_at));
        println!("size:        {} bytes", h.payload_size);
        println!("entries:     {}", fs.len());
    }
    Ok(ExitCode::SUCCESS)
}

pub fn handle_list(
    file: Option<PathBuf>,
    hashes: bool,
    json: bool,
    strict: bool,
) -> Result<ExitCode> {
    let fs = open_from(file, strict)?;
    let rows = list(&fs, &ListOptions { hashes })?;
    if json {
        let s = serde_json::to_string_pretty(&rows).map_err(io::Error::other)?;
        println!("{s}");
        return Ok(ExitCode::SUCCESS);
    }
    for r in rows {
        match r.blake3 {
            Some(h) => println!("{}  {} bytes  off={}  {h}", r.name, r.size, r.offset),
            None => println!("{}  {} bytes  off={}", r.name, r.size, r.offset),
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn handle_cat(
    entry: String,
    file: Option<PathBuf>,
    start: u64,
    len: Option<u64>,
    strict: bool,
) -> Result<ExitCode> {
    let fs = open_from(file, strict)?;
    let mut f = fs.open_file(&entry)?;
    f.seek(SeekFrom::Start(start))?;
    let mut reader = f.take(len.unwrap_or(u64::MAX));
    let mut out = io::stdout().lock();
    io::copy(&mut reader, &mut out)?;
    out.flush()?;
    Ok(ExitCode::SUCCESS)
}

pub fn handle_check(file: &Path) -> Result<ExitCode> {
    if has_bundle(file) {
        println!("yes");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("no");
        Ok(ExitCode::FAILURE)
    }
}
