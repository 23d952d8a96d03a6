//! Interactive statement loop
//!
//! Statements may span lines and end with `;` at the end of a line.
//! Lines starting with `.` outside a statement are meta commands.

use crate::explorer::table_names;
use sqlab_engine::export::write_csv;
use sqlab_engine::render::render_table;
use sqlab_engine::{QueryEngine, QueryResult};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use sqlab_schema::{sample_query, DATASETS};
use std::io::{BufRead, Write};

/// Print a result the way the query box shows it
pub(crate) fn write_result(out: &mut impl Write, result: &QueryResult) -> std::io::Result<()> {
    match result {
        QueryResult::Failure(err) => writeln!(out, "Error: {err}"),
        QueryResult::Success(_) => {
            if let Some(set) = result.result_set() {
                write!(out, "{}", render_table(set))?;
            }
            writeln!(out, "{}", result.summary())
        }
    }
}

pub(crate) struct Repl<'a> {
    engine: &'a QueryEngine,
    quoted: bool,
    last: Option<QueryResult>,
    buffer: String,
}

impl<'a> Repl<'a> {
    pub(crate) fn new(engine: &'a QueryEngine, quoted: bool) -> Self {
        Self {
            engine,
            quoted,
            last: None,
            buffer: String::new(),
        }
    }

    /// Process piped or scripted input until EOF or `.quit`
    pub(crate) fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> anyhow::Result<()> {
        for line in input.lines() {
            if !self.feed(&line?, out)? {
                return Ok(());
            }
        }
        self.finish(out)
    }

    /// Line-edited session on a terminal, with history
    ///
    /// Ctrl+C drops a half-typed statement, or leaves when there is none.
    /// Ctrl+D leaves after running whatever is buffered.
    pub(crate) fn run_interactive(&mut self, out: &mut impl Write) -> anyhow::Result<()> {
        let mut editor = DefaultEditor::new()?;
        loop {
            out.flush()?;
            match editor.readline(self.prompt()) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                    }
                    if !self.feed(&line, out)? {
                        return Ok(());
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    if !self.cancel_pending() {
                        return Ok(());
                    }
                    writeln!(out, "Statement cancelled")?;
                }
                Err(ReadlineError::Eof) => return self.finish(out),
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn prompt(&self) -> &'static str {
        if self.buffer.trim().is_empty() {
            "sqlab> "
        } else {
            "  ...> "
        }
    }

    /// Handle one input line; false when the session should stop
    fn feed(&mut self, line: &str, out: &mut impl Write) -> anyhow::Result<bool> {
        if self.buffer.trim().is_empty() && line.trim_start().starts_with('.') {
            return self.meta(line.trim(), out);
        }

        self.buffer.push_str(line);
        self.buffer.push('\n');
        if line.trim_end().ends_with(';') {
            self.flush(out)?;
        }
        Ok(true)
    }

    /// Run a trailing statement left without `;`
    fn finish(&mut self, out: &mut impl Write) -> anyhow::Result<()> {
        if !self.buffer.trim().is_empty() {
            self.flush(out)?;
        }
        Ok(())
    }

    /// Discard a partly entered statement; false if there was none
    fn cancel_pending(&mut self) -> bool {
        let pending = !self.buffer.trim().is_empty();
        self.buffer.clear();
        pending
    }

    fn flush(&mut self, out: &mut impl Write) -> anyhow::Result<()> {
        let query = std::mem::take(&mut self.buffer);
        self.submit(&query, out)
    }

    fn submit(&mut self, query: &str, out: &mut impl Write) -> anyhow::Result<()> {
        let result = self.engine.execute(query)?;
        write_result(out, &result)?;
        self.last = Some(result);
        Ok(())
    }

    /// Returns false when the loop should stop
    fn meta(&mut self, command: &str, out: &mut impl Write) -> anyhow::Result<bool> {
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            ".quit" | ".exit" => return Ok(false),
            ".tables" => {
                for table in table_names(DATASETS) {
                    writeln!(out, "{table}")?;
                }
            }
            ".sample" => match sample_query(arg) {
                Some(query) => {
                    writeln!(out, "{query}")?;
                    self.submit(&query, out)?;
                }
                None => writeln!(out, "Unknown table: {arg}")?,
            },
            ".export" if arg.is_empty() => writeln!(out, "Usage: .export <file>")?,
            ".export" => match &self.last {
                Some(result) => match write_csv(result, arg, self.quoted) {
                    Ok(()) => writeln!(out, "Exported to {arg}")?,
                    Err(err) => writeln!(out, "Error: {err}")?,
                },
                None => writeln!(out, "Error: nothing to export")?,
            },
            other => writeln!(out, "Unknown command: {other}")?,
        }
        Ok(true)
    }
}
