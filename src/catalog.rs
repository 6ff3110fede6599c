//! Catalog inspection and kit management commands.
//!
//! Backs `kitc kits create|list` and `kitc components list|get`. Everything
//! goes through the [`CatalogStore`] trait on a [`SqliteStore`].

use anyhow::{bail, Result};

use crate::config::Config;
use crate::ingest::KitSelector;
use crate::sqlite_store::SqliteStore;
use kit_catalog_core::models::{DesignKit, NewDesignKit};
use kit_catalog_core::store::CatalogStore;

/// Look up a kit without creating it.
pub async fn find_kit(store: &dyn CatalogStore, selector: &KitSelector) -> Result<DesignKit> {
    let found = match selector {
        KitSelector::Id(id) => store.get_kit(*id).await?,
        KitSelector::Name(name) => store.find_kit_by_name(name).await?,
    };
    match found {
        Some(kit) => Ok(kit),
        None => match selector {
            KitSelector::Id(id) => bail!("design kit not found: {}", id),
            KitSelector::Name(name) => bail!("design kit not found: {}", name),
        },
    }
}

pub async fn run_kits_create(
    config: &Config,
    name: &str,
    description: Option<String>,
    personality_tags: Vec<String>,
) -> Result<()> {
    if name.trim().is_empty() {
        bail!("kit name must not be empty");
    }

    let store = SqliteStore::open(config).await?;
    let existed = store.find_kit_by_name(name).await?.is_some();
    let kit = store
        .ensure_kit(&NewDesignKit {
            name: name.to_string(),
            description,
            personality_tags,
        })
        .await?;
    store.close().await;

    if existed {
        println!("Kit '{}' already exists: {}", kit.name, kit.id);
    } else {
        println!("Created kit '{}': {}", kit.name, kit.id);
    }
    Ok(())
}

pub async fn run_kits_list(config: &Config) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let kits = store.list_kits().await?;

    if kits.is_empty() {
        println!("No design kits.");
    }
    for kit in &kits {
        let count = store.list_components(kit.id).await?.len();
        println!("{}  {}  ({} components)", kit.id, kit.name, count);
        if let Some(ref description) = kit.description {
            println!("    {}", description);
        }
        if !kit.personality_tags.is_empty() {
            println!("    tags: {}", kit.personality_tags.join(", "));
        }
    }

    store.close().await;
    Ok(())
}

pub async fn run_components_list(config: &Config, kit: &KitSelector) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let kit = find_kit(&store, kit).await?;
    let components = store.list_components(kit.id).await?;
    store.close().await;

    println!("{} ({} components)", kit.name, components.len());
    for component in &components {
        println!(
            "  {:<32} {:<16} {}",
            component.name,
            component.category.as_deref().unwrap_or("-"),
            if component.embedding.is_some() {
                "embedded"
            } else {
                "no vector"
            }
        );
    }
    Ok(())
}

pub async fn run_components_get(
    config: &Config,
    kit: &KitSelector,
    name: &str,
    json: bool,
) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let kit = find_kit(&store, kit).await?;
    let component = store.get_component(kit.id, name).await?;
    store.close().await;

    let component = match component {
        Some(c) => c,
        None => bail!("component not found: {} in kit '{}'", name, kit.name),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&component)?);
        return Ok(());
    }

    println!("--- Component ---");
    println!("id:         {}", component.id);
    println!("name:       {}", component.name);
    println!("kit:        {} ({})", kit.name, component.kit_id);
    println!(
        "category:   {}",
        component.category.as_deref().unwrap_or("(none)")
    );
    println!(
        "embedding:  {}",
        component
            .embedding
            .as_ref()
            .map(|v| format!("{} dims", v.len()))
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!("created_at: {}", component.created_at.format("%Y-%m-%dT%H:%M:%SZ"));
    println!("updated_at: {}", component.updated_at.format("%Y-%m-%dT%H:%M:%SZ"));
    println!();
    println!("--- Metadata ---");
    println!("{}", serde_json::to_string_pretty(&component.metadata)?);
    Ok(())
}
