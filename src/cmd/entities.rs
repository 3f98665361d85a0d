//! `che-dash factories …` and `che-dash workspaces …`.

use anyhow::{Context, Result, bail};
use console::style;

use che_dash::api::{ApiClient, RemotePageService};
use che_dash::config::DashConfig;
use che_dash::errors::ListError;
use che_dash::list::{
    DeleteSummary, EntityLabels, FACTORY_LABELS, ListController, LoadOutcome, PageKey, PageService,
    PageWindow, WORKSPACE_LABELS,
};
use che_dash::models::{Factory, Workspace};
use che_dash::ui::icons::{TRASH, WARN};
use che_dash::ui::{
    ConsoleNotifier, DialoguerConfirmer, LoadingSpinner, factories_table, pagination_footer,
    workspaces_table,
};

use super::super::EntityCommands;

type Controller<S> = ListController<S, ConsoleNotifier, DialoguerConfirmer>;

pub async fn cmd_factories(config: &DashConfig, command: EntityCommands) -> Result<()> {
    let client = ApiClient::new(config.api_url()).context("Failed to build API client")?;
    let service = RemotePageService::<Factory>::factories(client)
        .await
        .context("Failed to resolve the current user")?;
    let controller = controller(config, service, FACTORY_LABELS)?;
    run(&controller, command, |items, c| {
        factories_table(items, |id| c.is_selected(id))
    })
    .await
}

pub async fn cmd_workspaces(config: &DashConfig, command: EntityCommands) -> Result<()> {
    let client = ApiClient::new(config.api_url()).context("Failed to build API client")?;
    let service = RemotePageService::<Workspace>::workspaces(client);
    let controller = controller(config, service, WORKSPACE_LABELS)?;
    run(&controller, command, |items, c| {
        workspaces_table(items, |id| c.is_selected(id))
    })
    .await
}

fn controller<S: PageService>(
    config: &DashConfig,
    service: S,
    labels: EntityLabels,
) -> Result<Controller<S>> {
    let window = PageWindow::first(config.page_size())?;
    Ok(ListController::new(
        service,
        ConsoleNotifier,
        DialoguerConfirmer::new(config.yes),
        labels,
        window,
    ))
}

/// Load the requested page, then list or delete from it.
async fn run<S, F>(controller: &Controller<S>, command: EntityCommands, render: F) -> Result<()>
where
    S: PageService,
    F: Fn(&[S::Item], &Controller<S>) -> String,
{
    let (page, search) = match &command {
        EntityCommands::List { page, search } | EntityCommands::Delete { page, search, .. } => {
            (*page, search.clone())
        }
    };
    load(controller, page).await?;
    if let Some(text) = search.as_deref() {
        controller.search(text);
    }

    match command {
        EntityCommands::List { .. } => {
            print_page(controller, &render);
            Ok(())
        }
        EntityCommands::Delete { ids, all, .. } => {
            if all {
                controller.select_all_visible();
            }
            for id in &ids {
                if !controller.set_selected(id, true) {
                    println!(
                        "{}{} {} is not on this page",
                        WARN,
                        controller.labels().singular,
                        style(id).yellow()
                    );
                }
            }
            delete(controller).await
        }
    }
}

async fn load<S: PageService>(controller: &Controller<S>, page: Option<PageKey>) -> Result<()> {
    let labels = controller.labels();
    let spinner = LoadingSpinner::start(format!("Loading {}...", labels.plural));
    let mut outcome = controller.load_initial().await;
    if let (LoadOutcome::Loaded, Some(key)) = (outcome, page) {
        outcome = controller.fetch_page_by_key(key).await;
    }
    spinner.finish();

    // The notifier has already reported the failure.
    if outcome == LoadOutcome::Failed {
        bail!("Could not load {}", labels.plural);
    }
    Ok(())
}

fn print_page<S, F>(controller: &Controller<S>, render: &F)
where
    S: PageService,
    F: Fn(&[S::Item], &Controller<S>) -> String,
{
    let labels = controller.labels();
    let items = controller.visible_items();
    if items.is_empty() {
        let filter = controller.filter();
        if filter.name.is_empty() {
            println!("No {} found.", labels.plural);
        } else {
            println!("No {} match '{}'.", labels.plural, filter.name);
        }
    } else {
        println!("{}", render(&items, controller));
    }

    if controller.is_pagination() {
        println!();
        println!("{}", pagination_footer(controller.pagination()));
    }
}

async fn delete<S: PageService>(controller: &Controller<S>) -> Result<()> {
    let labels = controller.labels();
    let selected = controller.selected_ids();
    if !selected.is_empty() {
        println!(
            "{}Selected {} {}: {}",
            TRASH,
            selected.len(),
            labels.noun(selected.len()),
            selected.join(", ")
        );
    }

    match controller.delete_selected().await {
        Ok(DeleteSummary::Cancelled) => {
            println!("Delete cancelled");
            Ok(())
        }
        Ok(DeleteSummary::Deleted { count }) => {
            tracing::debug!(count, "Bulk delete finished");
            Ok(())
        }
        // The notifier has already reported both failures.
        Err(ListError::EmptySelection { .. }) => bail!("Nothing to delete"),
        Err(e) => Err(e.into()),
    }
}

