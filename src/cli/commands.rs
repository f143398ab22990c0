use std::fmt::{self, Write as _};
use std::io::{self, Write as _};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Args;
use crossterm::style::Stylize;
use time::OffsetDateTime;

use crate::app::state::load_view;
use crate::app::App;
use crate::config::AppConfig;
use crate::editor;
use crate::grouping::GroupKind;
use crate::list::profiles::format_note_date;
use crate::list::{Content, Item, ListType, NoteFlags};
use crate::source::{JsonLibrary, NoteFilter};

#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// View to open: notes, notebooks, tags or trash
    #[arg(long)]
    pub view: Option<ListType>,
    /// Only show notes carrying this tag
    #[arg(long, conflicts_with_all = ["color", "notebook"])]
    pub tag: Option<String>,
    /// Only show notes with this color
    #[arg(long, conflicts_with = "notebook")]
    pub color: Option<String>,
    /// Notebook id; requires --topic
    #[arg(long, requires = "topic")]
    pub notebook: Option<String>,
    /// Topic id inside --notebook
    #[arg(long, requires = "notebook")]
    pub topic: Option<String>,
}

impl ViewArgs {
    pub fn filter(&self) -> NoteFilter {
        if let Some(tag) = &self.tag {
            return NoteFilter::Tagged(tag.clone());
        }
        if let Some(color) = &self.color {
            return NoteFilter::Colored(color.clone());
        }
        match (&self.notebook, &self.topic) {
            (Some(notebook), Some(topic)) => NoteFilter::Topic {
                notebook: notebook.clone(),
                topic: topic.clone(),
            },
            _ => NoteFilter::All,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub view: ViewArgs,
    /// Grouping for the notes view (none, default, abc, month, year)
    #[arg(long)]
    pub group_by: Option<GroupKind>,
}

pub fn run_tui(config: Arc<AppConfig>, args: &ViewArgs) -> Result<()> {
    let source = JsonLibrary::open_or_init(&config.library_path)
        .with_context(|| format!("opening library {}", config.library_path.display()))?;
    let (bridge, commands) = editor::channel();
    // no editor ships with the list; record what would have been sent to it
    thread::Builder::new()
        .name("editor-commands".into())
        .spawn(move || {
            for command in commands {
                tracing::info!(?command, "editor command");
            }
        })
        .context("spawning editor command thread")?;

    let mut app = App::new(config, Box::new(source), Box::new(bridge), args.filter())?;
    app.run()
}

pub fn list_view(config: Arc<AppConfig>, args: &ListArgs) -> Result<()> {
    let source = JsonLibrary::open_or_init(&config.library_path)
        .with_context(|| format!("opening library {}", config.library_path.display()))?;
    let list_type = args.view.view.unwrap_or(config.default_view);
    let group_by = args.group_by.unwrap_or(config.group_by);
    let view = load_view(
        &source,
        list_type,
        &args.view.filter(),
        group_by,
        OffsetDateTime::now_utc(),
    )?;
    let styled = atty::is(atty::Stream::Stdout);
    let output = render_plain(&view.heading, &view.items, view.group, styled)
        .context("formatting list output")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}").context("writing list output")?;
    Ok(())
}

fn render_plain(
    heading: &str,
    items: &[Item],
    group: GroupKind,
    styled: bool,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    if styled {
        write!(out, "{}", heading.bold())?;
    } else {
        out.push_str(heading);
    }
    if items.is_empty() {
        out.push_str("\n  (empty)");
        return Ok(out);
    }
    for item in items {
        write_item(&mut out, item, group, styled)?;
    }
    Ok(out)
}

fn write_item(out: &mut String, item: &Item, group: GroupKind, styled: bool) -> fmt::Result {
    match item.content_ref() {
        None => {
            let label = format!("[{}]", item.title());
            if styled {
                write!(out, "\n{}", label.cyan().bold())?;
            } else {
                write!(out, "\n{label}")?;
            }
        }
        Some(Content::Note(note)) => {
            out.push_str("\n  ");
            for (flag, marker) in [
                (NoteFlags::PINNED, "★ "),
                (NoteFlags::FAVORITE, "♥ "),
                (NoteFlags::LOCKED, "[L] "),
            ] {
                if note.flags.contains(flag) {
                    out.push_str(marker);
                }
            }
            let when = match note.deleted_at {
                Some(deleted_at) => format!(
                    "deleted {}",
                    format_note_date(deleted_at, GroupKind::Default)
                ),
                None => format_note_date(note.edited_at, group),
            };
            write!(out, "{}  {when}", item.title())?;
            for tag in &note.tags {
                write!(out, " #{tag}")?;
            }
        }
        Some(Content::Notebook(notebook)) => {
            let topics = notebook
                .topics
                .iter()
                .map(|topic| format!("{} ({})", topic.title, topic.note_count))
                .collect::<Vec<_>>()
                .join(" · ");
            write!(out, "\n  {}  {topics}", item.title())?;
        }
        Some(Content::Tag(tag)) => {
            write!(out, "\n  #{}  {}", item.title(), tag.note_count)?;
        }
        Some(Content::Unknown { kind }) => {
            tracing::warn!(kind, "skipping item of unknown kind");
        }
    }
    Ok(())
}
