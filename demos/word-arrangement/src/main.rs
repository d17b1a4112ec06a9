use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use slint::{CloseRequestResponse, ComponentHandle, ModelRc, VecModel};
use tracing_subscriber::EnvFilter;
use word_space::{
    Config, CsvResultWriter, Experiment, SessionFile, SessionLog, TokenView, WordList,
    WordSpaceController,
};

slint::include_modules!();

#[derive(Parser)]
#[command(name = "word-arrangement", version, about = "Word relatedness arrangement task")]
struct Cli {
    /// Participant identifier; also names the results folder.
    #[arg(long, required_unless_present = "recover")]
    participant: Option<String>,
    #[arg(long, default_value = "")]
    experimenter: String,
    /// `;`-delimited word list, one trial per row.
    #[arg(long, required_unless_present = "recover")]
    wordlist: Option<PathBuf>,
    /// Resume from a session log (`<data>/<participant>/log.json`).
    #[arg(long)]
    recover: Option<PathBuf>,
    /// JSON configuration; defaults are used for missing fields.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    data_dir: Option<String>,
    #[arg(long, default_value = "")]
    notes: String,
}

fn token_data(view: &TokenView) -> TokenData {
    TokenData {
        id: view.id.0 as i32,
        word: view.word.clone(),
        x: view.x,
        y: view.y,
        width: view.width,
        height: view.height,
        highlighted: view.highlighted,
        fill: view.fill,
        text_color: view.text_color,
        outline: view.outline,
        outline_width: view.outline_width,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.output.data_directory = dir;
    }

    let session = cli.recover.as_deref().map(SessionFile::open).transpose()?;
    let (participant, wordlist_path) = match &session {
        Some(session) => {
            let log = session.log();
            let wordlist = match cli.wordlist {
                Some(path) => path,
                None => session.wordlist_path(),
            };
            (log.participant_id.clone(), wordlist)
        }
        None => (
            cli.participant.unwrap_or_default(),
            cli.wordlist.unwrap_or_default(),
        ),
    };

    let wordlist = WordList::from_path(&wordlist_path, &config.experiment)?;
    let sink = CsvResultWriter::new(&config.output);
    let canvas = config.canvas.size();
    let data_directory = config.output.data_directory.clone();
    let mut experiment = Experiment::new(config, wordlist, participant.clone(), Box::new(sink))?;

    match session {
        Some(session) => experiment.resume(session)?,
        None => {
            let log =
                SessionLog::for_wordlist(participant, cli.experimenter, &wordlist_path, cli.notes)?;
            experiment.attach_session(SessionFile::create(&data_directory, log)?);
        }
    }

    let window = MainWindow::new()?;
    let ctrl = WordSpaceController::new(experiment);
    let w = window.as_weak();

    let tokens = Rc::new(VecModel::<TokenData>::default());
    window.set_tokens(ModelRc::from(tokens.clone()));
    window.set_stack_words(ctrl.stack_model());
    window.set_canvas_width(canvas.width);
    window.set_canvas_height(canvas.height);

    ctrl.set_refresh_handler(move |ctrl| {
        tokens.set_vec(ctrl.token_views().iter().map(token_data).collect::<Vec<_>>());
        if let Some(w) = w.upgrade() {
            w.set_window_title(ctrl.title());
            w.set_zoom_text(ctrl.zoom_text());
            w.set_highlight_text(ctrl.highlight_label());
            w.set_status_text(ctrl.status());
        }
    });

    window.on_pointer_pressed(ctrl.pointer_pressed_callback());
    window.on_pointer_moved(ctrl.pointer_moved_callback());
    window.on_pointer_released(ctrl.pointer_released_callback());
    window.on_scrolled(ctrl.scrolled_callback());
    window.on_key_pressed(ctrl.key_pressed_callback());
    window.on_place_word(ctrl.place_word_callback());
    window.on_end_trial(ctrl.end_trial_callback());
    window.on_canvas_resized(ctrl.canvas_resized_callback());
    window.on_recenter(ctrl.recenter_callback());
    window.on_toggle_highlight(ctrl.toggle_highlight_callback());

    window.window().on_close_requested({
        let ctrl = ctrl.clone();
        move || {
            if let Err(err) = ctrl.interrupt(Some("window closed".into())) {
                tracing::warn!(%err, "could not mark session as interrupted");
            }
            CloseRequestResponse::HideWindow
        }
    });

    ctrl.refresh();
    window.run()?;
    Ok(())
}
