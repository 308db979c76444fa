use crate::error::ContextError;
use std::panic::Location;
use std::path::{Path, PathBuf};

/// Where a `warning`/`error` call came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    /// Qualified function name, e.g. `my_service::orders::submit`.
    pub operation: String,
    pub file: String,
    pub line: u32,
}

/// Resolves the function that invoked the logger.
///
/// `location` is the call site captured with `#[track_caller]`. `depth`
/// selects how many operations further out to report: `0` is the function
/// containing `location`, `1` its caller, and so on. Wrappers around the
/// logger that are not themselves `#[track_caller]` raise `depth` to skip
/// their own frames.
pub trait CallerResolver: Send + Sync {
    fn resolve(
        &self,
        location: &'static Location<'static>,
        depth: usize,
    ) -> Result<CallerContext, ContextError>;
}

/// Resolver backed by a captured stack trace.
///
/// The operation comes from symbol names, which survive in release builds
/// without debug info. File and line come from the `#[track_caller]`
/// location; when line tables are present they also pick the exact frame
/// of the call site.
#[derive(Clone, Copy, Debug, Default)]
pub struct BacktraceResolver;

/// Resolver that only reports the call site, with the operation given by
/// the caller. Used where symbol lookup is too slow or unavailable.
#[derive(Clone, Debug)]
pub struct LocationResolver {
    pub operation: String,
}

#[derive(Debug)]
struct Frame {
    name: String,
    file: Option<PathBuf>,
    line: Option<u32>,
}

impl Frame {
    fn is_at(&self, location: &Location<'_>, match_line: bool) -> bool {
        let Some(file) = &self.file else {
            return false;
        };
        file.ends_with(Path::new(location.file())) && (!match_line || self.line == Some(location.line()))
    }
}

impl CallerResolver for BacktraceResolver {
    fn resolve(
        &self,
        location: &'static Location<'static>,
        depth: usize,
    ) -> Result<CallerContext, ContextError> {
        select(&collect_frames(), location, depth)
    }
}

/// Pick the operation `depth` levels out from the frame of `location`.
///
/// `frames` are innermost first, with the logger's own frames removed.
fn select(
    frames: &[Frame],
    location: &Location<'_>,
    depth: usize,
) -> Result<CallerContext, ContextError> {
    let anchor = frames
        .iter()
        .position(|f| f.is_at(location, true))
        .or_else(|| frames.iter().position(|f| f.is_at(location, false)))
        .or_else(|| frames.iter().position(|f| !is_runtime(&f.name)))
        .ok_or_else(|| ContextError::FrameNotFound {
            file: location.file().to_string(),
            line: location.line(),
        })?;

    // Walk outward one operation at a time; async bodies and their
    // enclosing fn collapse into one operation once `{{closure}}` is
    // stripped.
    let mut current = anchor;
    for _ in 0..depth {
        current = frames[current + 1..]
            .iter()
            .position(|f| f.name != frames[current].name && !is_runtime(&f.name))
            .map(|offset| current + 1 + offset)
            .ok_or_else(|| {
                ContextError::Unavailable(format!("stack is shallower than depth {}", depth))
            })?;
    }

    let frame = &frames[current];
    // Without line tables an outer frame has no position of its own; the
    // call site is the closest one known.
    let (file, line) = match (&frame.file, frame.line) {
        (Some(file), Some(line)) if depth > 0 => (file.display().to_string(), line),
        _ => (location.file().to_string(), location.line()),
    };

    Ok(CallerContext {
        operation: frame.name.clone(),
        file,
        line,
    })
}

impl CallerResolver for LocationResolver {
    fn resolve(
        &self,
        location: &'static Location<'static>,
        _depth: usize,
    ) -> Result<CallerContext, ContextError> {
        Ok(CallerContext {
            operation: self.operation.clone(),
            file: location.file().to_string(),
            line: location.line(),
        })
    }
}

/// Symbols of the current stack, innermost first, starting outside the
/// resolver's and logger's own frames.
fn collect_frames() -> Vec<Frame> {
    let mut frames = Vec::new();

    backtrace::trace(|frame| {
        backtrace::resolve_frame(frame, |symbol| {
            let Some(name) = symbol.name() else {
                return;
            };
            let name = operation_name(&format!("{:#}", name));
            if is_internal(&name) {
                // Everything inward of the resolver (unwinder included) goes too.
                frames.clear();
                return;
            }
            frames.push(Frame {
                name,
                file: symbol.filename().map(Path::to_path_buf),
                line: symbol.lineno(),
            });
        });
        true
    });

    frames
}

/// Drop async `{{closure}}` suffixes so a future's body reports the fn
/// that created it.
fn operation_name(symbol: &str) -> String {
    let mut name = symbol;
    while let Some(stripped) = name.strip_suffix("::{{closure}}") {
        name = stripped;
    }
    name.to_string()
}

/// Standard library and executor frames sitting between user operations.
fn is_runtime(name: &str) -> bool {
    let name = name.trim_start_matches('<');
    ["core::", "std::", "alloc::", "tokio::"]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

fn is_internal(name: &str) -> bool {
    name.starts_with("backtrace::")
        || name.contains("traces_logger::caller::BacktraceResolver")
        || name.starts_with("traces_logger::caller::collect_frames")
        || name.starts_with("traces_logger::logger::Logger::")
}
