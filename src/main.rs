use std::env;
use taskboard_sync::{App, Config, FileStorage};

// Headless shell: signs in, pulls every board with its lists and tasks
// through the sync layer, and prints a plain-text overview.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::load();
    let storage = FileStorage::open_default();
    let mut app = App::new(config, Box::new(storage));

    if !app.auth.is_authenticated() {
        match (env::var("TASKBOARD_EMAIL"), env::var("TASKBOARD_PASSWORD")) {
            (Ok(email), Ok(password)) => {
                app.login(&email, &password).await;
                if let Some(err) = app.auth.error() {
                    eprintln!("login failed: {}", err);
                }
            }
            _ => {
                eprintln!(
                    "no stored session; set TASKBOARD_EMAIL and TASKBOARD_PASSWORD to log in"
                );
            }
        }
    }

    if let Some(user) = app.auth.user() {
        println!("signed in as {} <{}>", user.name, user.email);
    }

    app.fetch_boards().await;
    if let Some(err) = app.boards.error() {
        eprintln!("boards: {}", err);
    }
    app.fetch_labels().await;
    if let Some(err) = app.labels.error() {
        eprintln!("labels: {}", err);
    }

    let boards = app.boards.items().to_vec();
    for board in &boards {
        if board.description.is_empty() {
            println!("{}", board.name);
        } else {
            println!("{} - {}", board.name, board.description);
        }

        app.fetch_lists(&board.id).await;
        if let Some(err) = app.lists.error() {
            eprintln!("  lists: {}", err);
            continue;
        }

        let lists = app.lists.items().to_vec();
        for list in &lists {
            println!("  [{}]", list.name);

            app.fetch_tasks(&list.id).await;
            if let Some(err) = app.tasks.error() {
                eprintln!("    tasks: {}", err);
                continue;
            }
            for task in app.tasks.items() {
                let mark = if task.completed { "x" } else { " " };
                let mut line = format!("    [{}] {}", mark, task.text);
                if let Some(due) = &task.due_date {
                    line.push_str(&format!(" (due {})", due));
                }
                println!("{}", line);
            }
        }
    }

    if !app.labels.items().is_empty() {
        let names: Vec<&str> = app
            .labels
            .items()
            .iter()
            .map(|label| label.name.as_str())
            .collect();
        println!("labels: {}", names.join(", "));
    }

    Ok(())
}
