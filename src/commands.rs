//! CLI subcommands and their handlers.

use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;

use crate::api::{ApiClient, Paginated};
use crate::config::Config;
use crate::model::{Article, ArticleDraft, Category, CategoryDraft};
use crate::session::Session;
use crate::store::{SqliteStore, Store};
use crate::sync::articles::{ArticleQuery, ArticleService};
use crate::sync::categories::CategoryService;

#[derive(Debug, Subcommand)]
pub enum Command {
  /// Browse and manage articles
  Articles {
    #[command(subcommand)]
    command: ArticleCommand,
  },
  /// Browse and manage categories
  Categories {
    #[command(subcommand)]
    command: CategoryCommand,
  },
  /// Sign in and store the session token
  Login {
    email: String,
    #[arg(long)]
    password: String,
  },
  /// Create an account and sign in
  Register {
    name: String,
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    password_confirmation: String,
  },
  /// Clear the stored session
  Logout,
  /// Show the signed-in user
  Whoami,
}

#[derive(Debug, Subcommand)]
pub enum ArticleCommand {
  /// List articles, filtered and paginated
  List {
    #[arg(short, long, default_value_t = 1)]
    page: u32,
    /// Case-insensitive substring match over title and content
    #[arg(short, long)]
    search: Option<String>,
    /// Restrict to one category id
    #[arg(short, long)]
    category: Option<String>,
    /// Serve the cached snapshot without hitting the API
    #[arg(long)]
    cached: bool,
  },
  /// Show a single article
  Show { id: String },
  /// Articles related to one category
  Related {
    category: String,
    /// Article id to leave out of the results
    #[arg(long)]
    exclude: String,
  },
  /// Create an article (admin)
  Create {
    #[arg(long)]
    title: String,
    #[arg(long)]
    content: String,
    #[arg(long, default_value = "")]
    image: String,
    #[arg(long)]
    category: String,
  },
  /// Update an article (admin)
  Update {
    id: String,
    #[arg(long)]
    title: String,
    #[arg(long)]
    content: String,
    #[arg(long, default_value = "")]
    image: String,
    #[arg(long)]
    category: String,
  },
  /// Delete an article (admin)
  Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
  /// List categories, paginated
  List {
    #[arg(short, long, default_value_t = 1)]
    page: u32,
    /// Case-insensitive substring match over the name
    #[arg(short, long)]
    search: Option<String>,
  },
  /// Print the full collection
  All {
    /// Serve the cached snapshot without hitting the API
    #[arg(long)]
    cached: bool,
  },
  /// Show a single category
  Show { id: String },
  /// Create a category (admin)
  Create { name: String },
  /// Rename a category (admin)
  Update {
    id: String,
    #[arg(long)]
    name: String,
  },
  /// Delete a category (admin)
  Delete { id: String },
}

pub async fn run(config: &Config, command: Command) -> Result<()> {
  let store = Arc::new(SqliteStore::open()?);
  let api = ApiClient::new(&config.api.url, Arc::clone(&store))?;
  let session = Session::new(api.clone(), Arc::clone(&store));
  let articles = ArticleService::new(api.clone(), Arc::clone(&store));
  let categories = CategoryService::new(api, store);

  match command {
    Command::Articles { command } => run_articles(command, &articles, &session).await,
    Command::Categories { command } => run_categories(command, &categories, &session).await,
    Command::Login { email, password } => {
      let auth = session.login(&email, &password).await?;
      println!("signed in as {} <{}>", auth.user.name, auth.user.email);
      Ok(())
    }
    Command::Register {
      name,
      email,
      password,
      password_confirmation,
    } => {
      let auth = session
        .register(&name, &email, &password, &password_confirmation)
        .await?;
      println!("registered {} <{}>", auth.user.name, auth.user.email);
      Ok(())
    }
    Command::Logout => {
      session.logout();
      println!("signed out");
      Ok(())
    }
    Command::Whoami => {
      match session.current_user() {
        Some(user) => println!("{} <{}> ({:?})", user.name, user.email, user.role),
        None if session.is_authenticated() => println!("signed in, user record unreadable"),
        None => println!("not signed in"),
      }
      Ok(())
    }
  }
}

async fn run_articles<S: Store>(
  command: ArticleCommand,
  articles: &ArticleService<ApiClient<S>, S>,
  session: &Session<S>,
) -> Result<()> {
  match command {
    ArticleCommand::List {
      page,
      search,
      category,
      cached,
    } => {
      let result = articles
        .list(&ArticleQuery {
          page,
          search,
          category_id: category,
          force_refresh: !cached,
        })
        .await?;
      print_article_page(&result);
      Ok(())
    }
    ArticleCommand::Show { id } => {
      let article = articles.get_by_id(&id).await?;
      print_article(&article);
      Ok(())
    }
    ArticleCommand::Related { category, exclude } => {
      let related = articles.get_related(&category, &exclude).await?;
      for article in &related {
        println!("{:<16} {}", article.id, article.title);
      }
      Ok(())
    }
    ArticleCommand::Create {
      title,
      content,
      image,
      category,
    } => {
      ensure_admin(session)?;
      let article = articles
        .create(&ArticleDraft {
          title,
          content,
          image,
          category_id: category,
        })
        .await?;
      println!("created article {}", article.id);
      Ok(())
    }
    ArticleCommand::Update {
      id,
      title,
      content,
      image,
      category,
    } => {
      ensure_admin(session)?;
      let article = articles
        .update(
          &id,
          &ArticleDraft {
            title,
            content,
            image,
            category_id: category,
          },
        )
        .await?;
      println!("updated article {}", article.id);
      Ok(())
    }
    ArticleCommand::Delete { id } => {
      ensure_admin(session)?;
      articles.delete(&id).await?;
      println!("deleted article {id}");
      Ok(())
    }
  }
}

async fn run_categories<S: Store>(
  command: CategoryCommand,
  categories: &CategoryService<ApiClient<S>, S>,
  session: &Session<S>,
) -> Result<()> {
  match command {
    CategoryCommand::List { page, search } => {
      let result = categories.list(page, search.as_deref()).await?;
      print_category_list(&result.data);
      print_page_footer(&result);
      Ok(())
    }
    CategoryCommand::All { cached } => {
      let all = categories.get_all(!cached).await?;
      print_category_list(&all);
      Ok(())
    }
    CategoryCommand::Show { id } => {
      let category = categories.get_by_id(&id).await?;
      println!("{:<16} {:<24} updated {}", category.id, category.name, category.updated_at);
      Ok(())
    }
    CategoryCommand::Create { name } => {
      ensure_admin(session)?;
      let category = categories.create(&CategoryDraft { name }).await?;
      println!("created category {}", category.id);
      Ok(())
    }
    CategoryCommand::Update { id, name } => {
      ensure_admin(session)?;
      let category = categories.update(&id, &CategoryDraft { name }).await?;
      println!("renamed category {} to {}", category.id, category.name);
      Ok(())
    }
    CategoryCommand::Delete { id } => {
      ensure_admin(session)?;
      categories.delete(&id).await?;
      println!("deleted category {id}");
      Ok(())
    }
  }
}

fn ensure_admin<S: Store>(session: &Session<S>) -> Result<()> {
  if session.is_admin() {
    Ok(())
  } else {
    Err(eyre!("admin privileges required, sign in with an admin account"))
  }
}

fn print_article(article: &Article) {
  println!("{}  [{}]", article.title, article.display_category());
  println!("id: {}  image: {}", article.id, article.image);
  println!("created: {}  updated: {}", article.created_at, article.updated_at);
  println!();
  println!("{}", article.content);
}

fn print_article_page(page: &Paginated<Article>) {
  for article in &page.data {
    println!(
      "{:<16} {:<48} {:<16} {}",
      article.id,
      article.title,
      article.display_category(),
      article.updated_at
    );
  }
  print_page_footer(page);
}

fn print_category_list(categories: &[Category]) {
  for category in categories {
    println!("{:<16} {}", category.id, category.name);
  }
}

fn print_page_footer<T>(page: &Paginated<T>) {
  println!(
    "page {}/{} ({} total)",
    page.pagination.current_page,
    page.pagination.total_pages.max(1),
    page.pagination.total
  );
}
