//! Bundled seed data and `Collection` bindings for the cached entities.
//!
//! The seed lists stand in for server state on a first run with no network;
//! they are replaced wholesale by the first successful remote fetch.

use crate::model::{Article, Category};

use super::Collection;

impl Collection for Article {
  const KEY: &'static str = "articles";

  fn seed() -> Vec<Self> {
    seed_articles()
  }
}

impl Collection for Category {
  const KEY: &'static str = "categories";

  fn seed() -> Vec<Self> {
    seed_categories()
  }
}

fn category(id: &str, name: &str) -> Category {
  Category {
    id: id.to_string(),
    name: name.to_string(),
    created_at: "2023-01-01T00:00:00Z".to_string(),
    updated_at: "2023-01-01T00:00:00Z".to_string(),
  }
}

fn seed_categories() -> Vec<Category> {
  vec![
    category("1", "Frontend"),
    category("2", "Backend"),
    category("3", "DevOps"),
    category("4", "Data Science"),
    category("5", "Security"),
  ]
}

struct SeedArticle {
  id: &'static str,
  title: &'static str,
  content: &'static str,
  category_id: &'static str,
  category_name: &'static str,
  created_at: &'static str,
}

const SEED_ARTICLES: &[SeedArticle] = &[
  SeedArticle {
    id: "1",
    title: "Getting Started with React Hooks",
    content: "Hooks let function components use state and lifecycle features without classes. This walkthrough covers useState, useEffect and the rules that keep them predictable.",
    category_id: "1",
    category_name: "Frontend",
    created_at: "2023-01-10T10:30:00Z",
  },
  SeedArticle {
    id: "2",
    title: "Utility-First CSS with Tailwind",
    content: "Tailwind trades hand-written stylesheets for composable utility classes. We look at when that trade pays off and how to keep markup readable.",
    category_id: "1",
    category_name: "Frontend",
    created_at: "2023-02-15T14:20:00Z",
  },
  SeedArticle {
    id: "3",
    title: "Building APIs with Node.js and Express",
    content: "Express remains the quickest path from an empty folder to a running HTTP API. Routing, middleware and error handling in one sitting.",
    category_id: "2",
    category_name: "Backend",
    created_at: "2023-03-05T09:45:00Z",
  },
  SeedArticle {
    id: "4",
    title: "Modeling Data in MongoDB",
    content: "Document databases reward designs that match access patterns. Embedding versus referencing, and where each one breaks down.",
    category_id: "2",
    category_name: "Backend",
    created_at: "2023-04-20T16:10:00Z",
  },
  SeedArticle {
    id: "5",
    title: "A Practical Introduction to Docker",
    content: "Containers isolate an application and its dependencies into a reproducible unit. Images, layers and volumes explained with real commands.",
    category_id: "3",
    category_name: "DevOps",
    created_at: "2023-05-12T11:30:00Z",
  },
  SeedArticle {
    id: "6",
    title: "CI/CD Pipelines with GitHub Actions",
    content: "GitHub Actions automates your build, test and release workflow straight from the repository. A minimal pipeline that grows with your project.",
    category_id: "3",
    category_name: "DevOps",
    created_at: "2023-06-08T13:45:00Z",
  },
  SeedArticle {
    id: "7",
    title: "First Steps in TensorFlow",
    content: "TensorFlow ships a full ecosystem for training and serving models. We train a small classifier end to end and export it for inference.",
    category_id: "4",
    category_name: "Data Science",
    created_at: "2023-07-14T10:20:00Z",
  },
  SeedArticle {
    id: "8",
    title: "Data Wrangling with Pandas",
    content: "Pandas gives Python fast, expressive data structures for analysis. Filtering, grouping and joining tabular data without leaving the REPL.",
    category_id: "4",
    category_name: "Data Science",
    created_at: "2023-08-23T15:50:00Z",
  },
  SeedArticle {
    id: "9",
    title: "Web Security Fundamentals",
    content: "Most production incidents trace back to a handful of avoidable mistakes. Input validation, session handling and the headers that matter.",
    category_id: "5",
    category_name: "Security",
    created_at: "2023-09-17T09:30:00Z",
  },
  SeedArticle {
    id: "10",
    title: "Understanding the OWASP Top 10",
    content: "The OWASP Top 10 captures consensus on the most critical web application risks. What each entry means and how to test for it.",
    category_id: "5",
    category_name: "Security",
    created_at: "2023-10-05T14:15:00Z",
  },
];

fn seed_articles() -> Vec<Article> {
  SEED_ARTICLES
    .iter()
    .map(|s| Article {
      id: s.id.to_string(),
      title: s.title.to_string(),
      content: s.content.to_string(),
      image: format!("https://picsum.photos/seed/article{}/800/450", s.id),
      category_id: s.category_id.to_string(),
      category_name: Some(s.category_name.to_string()),
      created_at: s.created_at.to_string(),
      updated_at: s.created_at.to_string(),
    })
    .collect()
}
