use color_eyre::eyre::Result;
use rps_table::{Config, ConsoleView, Coordinator, Event, HttpGameApi, UserAction};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let file_appender = rolling::daily("logs", "rps-table.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    let config = Config::from_env();
    let api = HttpGameApi::new(&config);
    let (mut coordinator, events) = Coordinator::new(api, ConsoleView::new(), config);
    let tx = coordinator.sender();

    // `--game <id>` resumes an already-created game
    if let Some(game_id) = game_arg() {
        coordinator.enter_game(game_id);
    } else {
        println!("commands: bet <amount> | move <rock|paper|scissors> | cancel | stop-search | rematch | quit");
    }

    tokio::spawn(read_commands(tx.clone()));
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(Event::Shutdown);
        }
    });

    coordinator.run(events).await
}

fn game_arg() -> Option<u64> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--game" {
            return args.next().and_then(|value| value.parse().ok());
        }
    }
    None
}

async fn read_commands(tx: mpsc::UnboundedSender<Event>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let mut parts = line.split_whitespace();
        let event = match (parts.next(), parts.next()) {
            (Some("bet"), Some(amount)) => amount
                .parse()
                .ok()
                .map(|amount| Event::Action(UserAction::PlaceBet { amount })),
            (Some("move"), Some(mv)) => mv
                .parse()
                .ok()
                .map(|mv| Event::Action(UserAction::SubmitMove { mv })),
            (Some("cancel"), None) => Some(Event::Action(UserAction::CancelGame)),
            (Some("stop-search"), None) => Some(Event::Action(UserAction::CancelSearch)),
            (Some("rematch"), None) => Some(Event::Action(UserAction::Rematch)),
            (Some("quit"), None) => Some(Event::Shutdown),
            (None, _) => None,
            _ => {
                println!(
                    "commands: bet <amount> | move <rock|paper|scissors> | cancel | stop-search | rematch | quit"
                );
                None
            }
        };
        if let Some(event) = event {
            let shutdown = matches!(event, Event::Shutdown);
            if tx.send(event).is_err() || shutdown {
                break;
            }
        }
    }
}
