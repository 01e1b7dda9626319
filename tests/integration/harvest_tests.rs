//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small fake shop and run the full
//! harvest cycle end-to-end against an in-memory database.

use std::time::{Duration, Instant};
use tiki_harvest::config::{
    Config, CrawlerConfig, OutputConfig, SelectorConfig, SiteConfig, UserAgentConfig,
};
use tiki_harvest::crawler::{Harvester, RunOptions};
use tiki_harvest::storage::{
    Category, ListingVariant, NewCategory, ProductRecord, SqliteStorage, Storage, StorageError,
    StorageResult,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
        },
        crawler: CrawlerConfig {
            pages_per_category: 1,
            request_delay_ms: 0,
            max_depth: 10,
            request_timeout_secs: 5,
            variants: vec![ListingVariant::Standard],
            express_marker: "support_p2h_delivery".to_string(),
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestHarvester".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
        },
        output: OutputConfig {
            database_path: ":memory:".to_string(),
        },
        selectors: SelectorConfig::default(),
    }
}

fn html_page(body: &str) -> String {
    format!("<html><head><title>Shop</title></head><body>{}</body></html>", body)
}

fn menu_page(links: &[(&str, &str)]) -> String {
    let anchors: String = links
        .iter()
        .map(|(href, name)| {
            format!(
                r#"<a class="MenuItem__MenuLink-sc-181aa19-1 fKvTQu" href="{}"><span class="text">{}</span></a>"#,
                href, name
            )
        })
        .collect();
    html_page(&anchors)
}

fn children_page(links: &[(&str, &str)]) -> String {
    let items: String = links
        .iter()
        .map(|(href, name)| {
            format!(
                r#"<div class="list-group-item is-child"><a href="{}">
                    {}
                </a></div>"#,
                href, name
            )
        })
        .collect();
    html_page(&items)
}

fn product_tile(sku: &str, price: &str) -> String {
    format!(
        r#"<div class="product-item" product-sku="{sku}" data-category="Root/sach/sach-{sku}">
            <a href="/p{sku}.html" title="Product {sku}">
                <img src="/img/{sku}.jpg">
                <span class="final-price">{price}</span>
                <p class="review">Chưa có nhận xét</p>
            </a>
        </div>"#,
        sku = sku,
        price = price
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn category_ids(categories: &[Category]) -> Vec<i64> {
    categories.iter().map(|c| c.id).collect()
}

#[tokio::test]
async fn test_tree_walk_persists_parents_before_children() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/",
        menu_page(&[("/books/c1", "Books"), ("/phones/c2", "Phones")]),
    )
    .await;
    mount_html(&mock_server, "/books/c1", children_page(&[])).await;
    mount_html(
        &mock_server,
        "/phones/c2",
        children_page(&[
            ("/smartphones/c3", "Smart   phones"),
            ("/tablets/c4", "Tablets"),
            ("/accessories/c5", "Accessories"),
        ]),
    )
    .await;
    mount_html(&mock_server, "/smartphones/c3", children_page(&[])).await;
    mount_html(&mock_server, "/tablets/c4", children_page(&[])).await;
    mount_html(&mock_server, "/accessories/c5", children_page(&[])).await;

    let config = create_test_config(&mock_server.uri());
    let storage = SqliteStorage::new_in_memory().expect("Failed to open DB");
    let mut harvester = Harvester::new(&config, storage).expect("Failed to create harvester");

    let summary = harvester
        .run(&RunOptions::default())
        .await
        .expect("Harvest failed");

    let storage = harvester.into_storage();
    let categories = storage.list_categories().expect("Failed to list categories");

    assert_eq!(categories.len(), 5);
    assert_eq!(summary.categories_saved, 5);

    assert_eq!(categories[0].id, 1);
    assert_eq!(categories[0].name, "Books");
    assert_eq!(categories[0].parent_id, None);
    assert_eq!(categories[1].id, 2);
    assert_eq!(categories[1].name, "Phones");
    assert_eq!(categories[1].parent_id, None);
    assert_eq!(
        categories[1].url,
        format!("{}/phones/c2", mock_server.uri())
    );

    for child in &categories[2..] {
        assert_eq!(child.parent_id, Some(2));
    }
    assert_eq!(categories[2].name, "Smart phones");
    assert_eq!(category_ids(&categories[2..]), vec![3, 4, 5]);

    // Every parent reference points at a category inserted earlier
    for category in &categories {
        if let Some(parent_id) = category.parent_id {
            assert!(parent_id < category.id);
        }
    }

    let leaves = storage.leaf_categories().expect("Failed to query leaves");
    assert_eq!(category_ids(&leaves), vec![1, 3, 4, 5]);
    assert_eq!(summary.leaf_categories, 4);

    // One empty listing page per leaf
    assert_eq!(summary.listing_pages, 4);
    assert_eq!(summary.empty_listing_pages, 4);
    assert_eq!(summary.products_saved, 0);
}

#[tokio::test]
async fn test_grandchildren_are_expanded_depth_first() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/",
        menu_page(&[("/a", "A"), ("/b", "B")]),
    )
    .await;
    mount_html(
        &mock_server,
        "/a",
        children_page(&[("/a1", "A1"), ("/a2", "A2")]),
    )
    .await;
    mount_html(&mock_server, "/a1", children_page(&[("/a1x", "A1x")])).await;
    mount_html(&mock_server, "/a2", children_page(&[])).await;
    mount_html(&mock_server, "/a1x", children_page(&[])).await;
    mount_html(&mock_server, "/b", children_page(&[("/b1", "B1")])).await;
    mount_html(&mock_server, "/b1", children_page(&[])).await;

    let config = create_test_config(&mock_server.uri());
    let mut harvester = Harvester::new(&config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    harvester.run(&RunOptions::default()).await.unwrap();

    let names: Vec<String> = harvester
        .storage()
        .list_categories()
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();

    assert_eq!(names, vec!["A", "B", "A1", "A2", "A1x", "B1"]);
}

#[tokio::test]
async fn test_failed_category_page_does_not_stop_the_walk() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/",
        menu_page(&[("/broken", "Broken"), ("/ok", "Ok")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/ok", children_page(&[("/ok/child", "Child")])).await;
    mount_html(&mock_server, "/ok/child", children_page(&[])).await;

    let config = create_test_config(&mock_server.uri());
    let mut harvester = Harvester::new(&config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = harvester.run(&RunOptions::default()).await.unwrap();

    // Two category fetches fail: the tree page of /broken and its listing page
    assert_eq!(summary.category_pages_failed, 1);
    assert_eq!(summary.listing_pages_failed, 1);
    assert_eq!(summary.categories_saved, 3);

    let leaves = harvester.storage().leaf_categories().unwrap();
    assert_eq!(category_ids(&leaves), vec![1, 3]);
}

#[tokio::test]
async fn test_unreachable_root_ends_with_empty_summary() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let mut harvester = Harvester::new(&config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = harvester.run(&RunOptions::default()).await.unwrap();

    assert_eq!(summary.category_pages_failed, 1);
    assert_eq!(summary.categories_saved, 0);
    assert_eq!(summary.listing_pages, 0);
}

#[tokio::test]
async fn test_depth_limit_leaves_deep_categories_unexpanded() {
    let mock_server = MockServer::start().await;

    mount_html(&mock_server, "/", menu_page(&[("/level1", "Level 1")])).await;
    mount_html(
        &mock_server,
        "/level1",
        children_page(&[("/level2", "Level 2")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/level2"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("")))
        .mount(&mock_server)
        .await;
    // The child page of level 2 must never be requested
    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri());
    config.crawler.max_depth = 2;

    let mut harvester = Harvester::new(&config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = harvester.run(&RunOptions::default()).await.unwrap();

    assert_eq!(summary.categories_saved, 2);
    assert_eq!(summary.depth_limited, 1);
    let leaves = harvester.storage().leaf_categories().unwrap();
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].name, "Level 2");
}

#[tokio::test]
async fn test_products_are_harvested_per_variant() {
    let mock_server = MockServer::start().await;

    mount_html(&mock_server, "/", menu_page(&[("/books?src=menu", "Books")])).await;

    // Express listing is mounted first so it wins over the standard one
    Mock::given(method("GET"))
        .and(path("/books"))
        .and(query_param("page", "1"))
        .and(query_param("support_p2h_delivery", ""))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page(&product_tile("900", "75.000đ"))),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/books"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page(&format!(
            r#"{}{}<div class="product-item" data-category="Root/sach"><a href="/x" title="No sku"></a></div>"#,
            product_tile("100", "1.234.567đ"),
            product_tile("101", "99.000đ"),
        ))))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/books"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("")))
        .expect(2)
        .mount(&mock_server)
        .await;
    // Child page of the only category, no children
    mount_html(&mock_server, "/books", children_page(&[])).await;

    let mut config = create_test_config(&mock_server.uri());
    config.crawler.pages_per_category = 2;
    config.crawler.variants = vec![ListingVariant::Standard, ListingVariant::Express];

    let mut harvester = Harvester::new(&config, SqliteStorage::new_in_memory().unwrap()).unwrap();
    let summary = harvester.run(&RunOptions::default()).await.unwrap();

    assert_eq!(summary.listing_pages, 4);
    assert_eq!(summary.empty_listing_pages, 2);
    assert_eq!(summary.products_saved, 3);
    assert_eq!(summary.products_rejected, 1);

    let storage = harvester.into_storage();
    let standard = storage.list_products(ListingVariant::Standard).unwrap();
    let express = storage.list_products(ListingVariant::Express).unwrap();

    assert_eq!(standard.len(), 2);
    assert_eq!(standard[0].sku, "100");
    assert_eq!(standard[0].final_price, 1_234_567);
    assert_eq!(standard[0].regular_price, None);
    assert_eq!(standard[0].review_count, 0);
    assert_eq!(standard[0].category_label, "sach-100");
    assert_eq!(standard[0].category_id, 1);
    assert_eq!(
        standard[0].url,
        format!("{}/p100.html", mock_server.uri())
    );

    assert_eq!(express.len(), 1);
    assert_eq!(express[0].sku, "900");
    assert_eq!(express[0].variant, ListingVariant::Express);
}

#[tokio::test]
async fn test_skip_tree_reuses_stored_categories() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(menu_page(&[])))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_html(
        &mock_server,
        "/stored",
        html_page(&product_tile("7", "10.000đ")),
    )
    .await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    storage
        .insert_category(&NewCategory::root(
            "Stored",
            format!("{}/stored", mock_server.uri()),
        ))
        .unwrap();

    let config = create_test_config(&mock_server.uri());
    let mut harvester = Harvester::new(&config, storage).unwrap();
    let summary = harvester
        .run(&RunOptions {
            skip_tree: true,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(summary.categories_saved, 0);
    assert_eq!(summary.products_saved, 1);
}

#[tokio::test]
async fn test_fresh_run_clears_only_harvested_variant() {
    let mock_server = MockServer::start().await;
    mount_html(&mock_server, "/stored", html_page("")).await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let id = storage
        .insert_category(&NewCategory::root(
            "Stored",
            format!("{}/stored", mock_server.uri()),
        ))
        .unwrap();
    for variant in ListingVariant::ALL {
        storage
            .insert_product(&ProductRecord {
                category_id: id,
                category_label: "stored".to_string(),
                sku: "old".to_string(),
                title: "Old".to_string(),
                url: "https://tiki.vn/old".to_string(),
                image_url: "https://tiki.vn/old.jpg".to_string(),
                regular_price: Some(0),
                final_price: 1,
                discount_label: Some("-1%".to_string()),
                review_count: 1,
                variant,
            })
            .unwrap();
    }

    let config = create_test_config(&mock_server.uri());
    let mut harvester = Harvester::new(&config, storage).unwrap();
    harvester
        .run(&RunOptions {
            skip_tree: true,
            fresh: true,
            variants: vec![ListingVariant::Express],
        })
        .await
        .unwrap();

    let storage = harvester.storage();
    assert_eq!(storage.count_products(ListingVariant::Express).unwrap(), 0);
    assert_eq!(storage.count_products(ListingVariant::Standard).unwrap(), 1);
}

#[tokio::test]
async fn test_listing_requests_are_spaced_by_delay() {
    let mock_server = MockServer::start().await;
    mount_html(&mock_server, "/stored", html_page("")).await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    storage
        .insert_category(&NewCategory::root(
            "Stored",
            format!("{}/stored", mock_server.uri()),
        ))
        .unwrap();

    let mut config = create_test_config(&mock_server.uri());
    config.crawler.pages_per_category = 3;
    config.crawler.request_delay_ms = 100;

    let mut harvester = Harvester::new(&config, storage).unwrap();
    let start = Instant::now();
    let summary = harvester
        .run(&RunOptions {
            skip_tree: true,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(summary.listing_pages, 3);
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_delay_follows_slow_responses() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stored"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page(""))
                .set_delay(Duration::from_millis(400)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    storage
        .insert_category(&NewCategory::root(
            "Stored",
            format!("{}/stored", mock_server.uri()),
        ))
        .unwrap();

    let mut config = create_test_config(&mock_server.uri());
    config.crawler.pages_per_category = 2;
    config.crawler.request_delay_ms = 300;

    let mut harvester = Harvester::new(&config, storage).unwrap();
    let start = Instant::now();
    harvester
        .run(&RunOptions {
            skip_tree: true,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    // Two slow fetches plus one full pause between them
    assert!(start.elapsed() >= Duration::from_millis(1100));
}

/// Storage double that refuses one category name and one product SKU
struct RejectingStorage {
    inner: SqliteStorage,
    rejected_category: Option<&'static str>,
    rejected_sku: Option<&'static str>,
}

impl RejectingStorage {
    fn new(inner: SqliteStorage) -> Self {
        Self {
            inner,
            rejected_category: None,
            rejected_sku: None,
        }
    }
}

fn disk_full() -> StorageError {
    StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
}

impl Storage for RejectingStorage {
    fn insert_category(&mut self, category: &NewCategory) -> StorageResult<i64> {
        if self.rejected_category.is_some_and(|name| name == category.name) {
            return Err(disk_full());
        }
        self.inner.insert_category(category)
    }

    fn get_category(&self, id: i64) -> StorageResult<Category> {
        self.inner.get_category(id)
    }

    fn list_categories(&self) -> StorageResult<Vec<Category>> {
        self.inner.list_categories()
    }

    fn leaf_categories(&self) -> StorageResult<Vec<Category>> {
        self.inner.leaf_categories()
    }

    fn child_categories(&self, parent_id: i64) -> StorageResult<Vec<Category>> {
        self.inner.child_categories(parent_id)
    }

    fn count_categories(&self) -> StorageResult<u64> {
        self.inner.count_categories()
    }

    fn count_root_categories(&self) -> StorageResult<u64> {
        self.inner.count_root_categories()
    }

    fn insert_product(&mut self, product: &ProductRecord) -> StorageResult<i64> {
        if self.rejected_sku.is_some_and(|sku| sku == product.sku) {
            return Err(disk_full());
        }
        self.inner.insert_product(product)
    }

    fn list_products(&self, variant: ListingVariant) -> StorageResult<Vec<ProductRecord>> {
        self.inner.list_products(variant)
    }

    fn count_products(&self, variant: ListingVariant) -> StorageResult<u64> {
        self.inner.count_products(variant)
    }

    fn clear_products(&mut self, variant: ListingVariant) -> StorageResult<()> {
        self.inner.clear_products(variant)
    }
}

#[tokio::test]
async fn test_rejected_insert_does_not_stop_the_page() {
    let mock_server = MockServer::start().await;
    mount_html(
        &mock_server,
        "/stored",
        html_page(&format!(
            "{}{}{}",
            product_tile("1", "10đ"),
            product_tile("2", "20đ"),
            product_tile("3", "30đ")
        )),
    )
    .await;

    let mut inner = SqliteStorage::new_in_memory().unwrap();
    inner
        .insert_category(&NewCategory::root(
            "Stored",
            format!("{}/stored", mock_server.uri()),
        ))
        .unwrap();
    let mut storage = RejectingStorage::new(inner);
    storage.rejected_sku = Some("2");

    let config = create_test_config(&mock_server.uri());
    let mut harvester = Harvester::new(&config, storage).unwrap();
    let summary = harvester
        .run(&RunOptions {
            skip_tree: true,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(summary.products_saved, 2);
    assert_eq!(summary.persistence_failures, 1);

    let skus: Vec<String> = harvester
        .storage()
        .list_products(ListingVariant::Standard)
        .unwrap()
        .into_iter()
        .map(|p| p.sku)
        .collect();
    assert_eq!(skus, vec!["1", "3"]);
}

#[tokio::test]
async fn test_rejected_category_drops_its_subtree() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/",
        menu_page(&[("/lost", "Lost"), ("/kept", "Kept")]),
    )
    .await;
    // Children of a category that was never saved are never requested
    Mock::given(method("GET"))
        .and(path("/lost"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(children_page(&[("/lost/a", "A")])),
        )
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/kept", children_page(&[("/kept/b", "B")])).await;
    mount_html(&mock_server, "/kept/b", children_page(&[])).await;

    let mut storage = RejectingStorage::new(SqliteStorage::new_in_memory().unwrap());
    storage.rejected_category = Some("Lost");

    let config = create_test_config(&mock_server.uri());
    let mut harvester = Harvester::new(&config, storage).unwrap();
    let summary = harvester.run(&RunOptions::default()).await.unwrap();

    assert_eq!(summary.persistence_failures, 1);
    assert_eq!(summary.categories_saved, 2);

    let names: Vec<String> = harvester
        .storage()
        .list_categories()
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Kept", "B"]);
}
