use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use client_core::{
    load_company_detail, view::row_class, ApiClient, ConsoleContext, Detail, DirectorySink,
    Editable, Entity, EntityApi, ExportOutcome, FormController, FormDraft,
    ListController, ReloadOutcome, RowState, SubmitOutcome, Theme,
};
use shared::{
    domain::{Benefit, Company, CompanyId, Industry, Scheme},
    protocol::{ExportFormat, StatusAction},
};

use crate::config::Settings;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Client companies.
    Companies {
        #[command(subcommand)]
        action: EntityCommand,
    },
    Industries {
        #[command(subcommand)]
        action: EntityCommand,
    },
    /// Insurance benefits offered under plans.
    Benefits {
        #[command(subcommand)]
        action: EntityCommand,
    },
    /// Schemes are read-only here; create and update are rejected.
    Schemes {
        #[command(subcommand)]
        action: EntityCommand,
    },
    /// Company counts by status and industry.
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// One company with the schemes attached to it.
    CompanyDetail { id: i64 },
    Theme {
        #[command(subcommand)]
        action: ThemeCommand,
    },
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum EntityCommand {
    List(ListArgs),
    /// Download a server-rendered export of the records matching `--search`.
    Export {
        #[arg(long, default_value = "csv")]
        format: String,
        #[arg(long)]
        search: Option<String>,
    },
    Delete {
        id: i64,
    },
    /// Apply `activate`, `deactivate` or `suspend`.
    Status {
        id: i64,
        action: String,
    },
    Create {
        /// `field=value`, repeatable.
        #[arg(long = "set", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },
    Update {
        id: i64,
        #[arg(long = "set", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    #[arg(long)]
    search: Option<String>,
    /// Column to sort by, e.g. `company_name`.
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    desc: bool,
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[arg(long)]
    rows: Option<usize>,
    /// Highlights the row with this id.
    #[arg(long)]
    selected: Option<i64>,
    /// Skip the cached snapshot and go straight to the backend.
    #[arg(long)]
    refresh: bool,
}

#[derive(Subcommand, Debug)]
pub enum ThemeCommand {
    Get,
    Set { theme: String },
    Toggle,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Drop every cached list snapshot.
    Clear,
    /// Drop all persisted console state, theme included.
    Reset,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{raw}'"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((field.to_string(), value.to_string()))
}

type Api = Arc<ApiClient>;

pub struct Console {
    api: Api,
    context: Arc<ConsoleContext>,
    settings: Settings,
}

impl Console {
    pub fn new(api: Api, context: Arc<ConsoleContext>, settings: Settings) -> Self {
        Self {
            api,
            context,
            settings,
        }
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Companies { action } => self.editable::<Company>(action).await,
            Command::Industries { action } => self.editable::<Industry>(action).await,
            Command::Benefits { action } => self.editable::<Benefit>(action).await,
            Command::Schemes { action } => self.entity::<Scheme>(action).await,
            Command::Stats { json } => self.stats(json).await,
            Command::CompanyDetail { id } => self.company_detail(CompanyId(id)).await,
            Command::Theme { action } => self.theme(action).await,
            Command::Cache { action } => self.cache(action).await,
        }
    }

    fn list_controller<T: Entity>(&self) -> ListController<T, Api> {
        ListController::with_cache(Arc::clone(&self.api), &self.context)
    }

    async fn editable<T: Editable>(&self, action: EntityCommand) -> Result<()> {
        match action {
            EntityCommand::Create { fields } => {
                let mut form = FormController::<T, Api>::new(Arc::clone(&self.api));
                form.open_create();
                self.submit(form, fields).await
            }
            EntityCommand::Update { id, fields } => {
                let current = EntityApi::<T>::retrieve(self.api.as_ref(), T::Id::from(id))
                    .await
                    .with_context(|| format!("failed to load {} {id}", T::RESOURCE))?;
                let mut form = FormController::<T, Api>::new(Arc::clone(&self.api));
                form.open_edit(&current);
                self.submit(form, fields).await
            }
            other => self.entity::<T>(other).await,
        }
    }

    async fn entity<T: Entity>(&self, action: EntityCommand) -> Result<()> {
        let list = self.list_controller::<T>();
        match action {
            EntityCommand::List(args) => self.list(&list, args).await,
            EntityCommand::Export { format, search } => {
                let format = ExportFormat::parse(&format)
                    .with_context(|| format!("unknown export format '{format}'; use csv, xlsx or pdf"))?;
                if let Some(search) = search {
                    list.set_search(search).await;
                }
                let sink = DirectorySink::new(&self.settings.export_dir);
                match list.export(format, &sink).await? {
                    ExportOutcome::Saved { filename, bytes } => {
                        println!("Saved {} ({bytes} bytes)", sink.root().join(filename).display());
                    }
                    ExportOutcome::AlreadyInFlight => println!("An export is already running"),
                }
                Ok(())
            }
            EntityCommand::Delete { id } => {
                list.delete(T::Id::from(id)).await?;
                println!("Deleted {} {id}", T::RESOURCE);
                Ok(())
            }
            EntityCommand::Status { id, action } => {
                let action = StatusAction::parse(&action).with_context(|| {
                    format!("unknown status action '{action}'; use activate, deactivate or suspend")
                })?;
                list.change_status(T::Id::from(id), action).await?;
                println!(
                    "{} {id} is now {}",
                    T::RESOURCE,
                    action.resulting_status().as_str()
                );
                Ok(())
            }
            EntityCommand::Create { .. } | EntityCommand::Update { .. } => {
                bail!("{} cannot be edited from the console", T::RESOURCE)
            }
        }
    }

    async fn list<T: Entity>(&self, list: &ListController<T, Api>, args: ListArgs) -> Result<()> {
        let outcome = if args.refresh {
            list.refresh().await?
        } else {
            list.mount().await?
        };
        if outcome == ReloadOutcome::KeptStale {
            eprintln!("Backend unreachable; showing cached {}", T::RESOURCE);
        }

        list.set_rows_per_page(args.rows.unwrap_or(self.settings.page_size))
            .await;
        if let Some(search) = args.search {
            list.set_search(search).await;
        }
        if let Some(name) = args.sort {
            let field = T::parse_field(&name).with_context(|| {
                let known: Vec<&str> = T::FIELDS.iter().map(|(name, _)| *name).collect();
                format!("cannot sort {} by '{name}'; try one of {}", T::RESOURCE, known.join(", "))
            })?;
            list.set_sort(field).await;
            if args.desc {
                list.set_sort(field).await;
            }
        }
        list.set_page(args.page).await;

        let view = list.derived_view().await;
        let selected = args.selected.map(T::Id::from);
        print_rows(&view.items, selected);
        if view.total_pages == 0 {
            println!("No matching {}", T::RESOURCE);
        } else {
            println!(
                "Page {} of {} ({} matching, {} per page)",
                view.page, view.total_pages, view.filtered_count, view.page_size
            );
        }
        Ok(())
    }

    async fn submit<T: Editable>(
        &self,
        mut form: FormController<T, Api>,
        fields: Vec<(String, String)>,
    ) -> Result<()> {
        for (name, value) in &fields {
            form.set_field(name, value).with_context(|| {
                format!(
                    "accepted {} fields: {}",
                    T::RESOURCE,
                    <T::Draft as FormDraft>::FIELD_NAMES.join(", ")
                )
            })?;
        }

        let list = self.list_controller::<T>();
        match form.submit(&list).await? {
            SubmitOutcome::Saved(entity) => {
                println!("Saved {} {}", T::RESOURCE, entity.id());
                Ok(())
            }
            SubmitOutcome::Invalid | SubmitOutcome::Rejected => {
                for (field, message) in form.errors() {
                    let value = form.draft().field(field).unwrap_or_default();
                    eprintln!("  {field} = {value:?}: {message}");
                }
                bail!("{} form was not saved", T::RESOURCE)
            }
        }
    }

    async fn stats(&self, json: bool) -> Result<()> {
        let stats = self.api.company_statistics().await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }
        println!(
            "Companies: {} total, {} active, {} inactive, {} suspended",
            stats.total_companies,
            stats.active_companies,
            stats.inactive_companies,
            stats.suspended_companies
        );
        for row in &stats.industries {
            println!("  {:<28} {}", row.industry_name, row.count);
        }
        Ok(())
    }

    async fn company_detail(&self, id: CompanyId) -> Result<()> {
        match load_company_detail(self.api.as_ref(), id).await? {
            Detail::Found(detail) => {
                for (name, field) in Company::FIELDS {
                    println!("{name:>16}: {}", detail.company.field_value(*field));
                }
                println!();
                if detail.schemes.is_empty() {
                    println!("No schemes for this company");
                } else {
                    print_rows(&detail.schemes, None);
                }
                Ok(())
            }
            Detail::RedirectToList => {
                println!("Company {id} no longer exists; showing the company list");
                let list = self.list_controller::<Company>();
                self.list(&list, ListArgs::default()).await
            }
        }
    }

    async fn theme(&self, action: ThemeCommand) -> Result<()> {
        let theme = match action {
            ThemeCommand::Get => self.context.theme().await,
            ThemeCommand::Set { theme } => {
                let theme = Theme::parse(&theme)
                    .with_context(|| format!("unknown theme '{theme}'; use light or dark"))?;
                self.context.set_theme(theme).await?;
                theme
            }
            ThemeCommand::Toggle => {
                let theme = self.context.theme().await.toggled();
                self.context.set_theme(theme).await?;
                theme
            }
        };
        println!("{theme}");
        Ok(())
    }

    async fn cache(&self, action: CacheCommand) -> Result<()> {
        match action {
            CacheCommand::Clear => {
                let cleared = self.context.clear_caches().await?;
                println!("Cleared {cleared} list cache(s)");
            }
            CacheCommand::Reset => {
                self.context.reset().await?;
                println!("Console state reset");
            }
        }
        Ok(())
    }
}

fn print_rows<T: Entity>(items: &[T], selected: Option<T::Id>) {
    let header: Vec<&str> = T::FIELDS.iter().map(|(name, _)| *name).collect();
    println!("{:<16} {}", "", header.join(" | "));
    for item in items {
        let state = RowState {
            hovered: false,
            active: selected == Some(item.id()),
        };
        let cells: Vec<String> = T::FIELDS
            .iter()
            .map(|(_, field)| item.field_value(*field).to_string())
            .collect();
        println!("{:<16} {}", row_class(state), cells.join(" | "));
    }
}
