use bazaar_api::config::ApiConfig;
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build app (same router as prod) against in-memory stores, but
        // bind to an ephemeral port.
        let app = bazaar_api::app::build_app(&ApiConfig::in_memory()).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn address_body() -> serde_json::Value {
    json!({
        "street": "12 Canal Walk",
        "city": "Galway",
        "state": "CT",
        "zipCode": "H91"
    })
}

/// Build the `{productId: quantity}` wire map from runtime ids.
fn items_map(entries: &[(&str, i64)]) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (product_id, quantity) in entries {
        map.insert((*product_id).to_string(), json!(quantity));
    }
    serde_json::Value::Object(map)
}

async fn create_product(
    client: &reqwest::Client,
    base_url: &str,
    title: &str,
    price: u64,
    stock: i64,
    category: &str,
) -> String {
    let res = client
        .post(format!("{}/market", base_url))
        .json(&json!({
            "title": title,
            "desc": "black box test product",
            "img": "https://img.example/p.png",
            "price": price,
            "rating": 4.0,
            "stock": stock,
            "uid": "seller-1",
            "nameseller": "Hana",
            "imgseller": "https://img.example/s.png",
            "category": category,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Product created successfully");
    body["id"].as_str().unwrap().to_string()
}

async fn register_user(client: &reqwest::Client, base_url: &str, uid: &str) {
    let res = client
        .post(format!("{}/user", base_url))
        .json(&json!({ "uid": uid }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

async fn add_inventory(
    client: &reqwest::Client,
    base_url: &str,
    uid: &str,
    items: serde_json::Value,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/inventory", base_url))
        .json(&json!({ "uid": uid, "items": items }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

async fn product_stock(client: &reqwest::Client, base_url: &str, id: &str) -> i64 {
    let res = client
        .get(format!("{}/product?id={}", base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    body["stock"].as_i64().unwrap()
}

async fn inventory_of(client: &reqwest::Client, base_url: &str, uid: &str) -> serde_json::Value {
    let res = client
        .get(format!("{}/inventory?uid={}", base_url, uid))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    body["inventory"].clone()
}

fn line_for<'a>(outcome: &'a serde_json::Value, product_id: &str) -> &'a serde_json::Value {
    outcome["lines"]
        .as_array()
        .unwrap()
        .iter()
        .find(|line| line["productId"] == product_id)
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_responds_ok() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn market_listing_and_product_lookup() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let id = create_product(&client, &srv.base_url, "Walnut chess set", 4_999, 5, "games").await;

    let res = client
        .get(format!("{}/market", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let listing: serde_json::Value = res.json().await.unwrap();
    let listing = listing.as_array().unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0]["id"], id.as_str());
    assert_eq!(listing[0]["desc"], "black box test product");

    let res = client
        .get(format!("{}/product?id={}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let product: serde_json::Value = res.json().await.unwrap();
    assert_eq!(product["title"], "Walnut chess set");
    assert_eq!(product["price"], 4_999);
    assert_eq!(product["stock"], 5);

    let res = client
        .get(format!("{}/product", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Product ID is required");

    let res = client
        .get(format!("{}/product?id=missing", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
async fn product_creation_validates_the_required_field_list() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/market", srv.base_url))
        .json(&json!({ "title": "No description" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Missing required field: desc");

    let res = client
        .post(format!("{}/market", srv.base_url))
        .json(&json!({
            "title": "Negative stock",
            "desc": "d",
            "img": "i",
            "price": 100,
            "rating": 4.0,
            "stock": -1,
            "uid": "seller-1",
            "nameseller": "n",
            "imgseller": "i",
            "category": "c",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Stock must be a non-negative number");
}

#[tokio::test]
async fn category_search_is_a_case_insensitive_substring_match() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    create_product(&client, &srv.base_url, "Chess", 1_000, 5, "Board Games").await;
    create_product(&client, &srv.base_url, "Radio", 2_000, 5, "Electronics").await;

    let res = client
        .get(format!("{}/market/category?category=game", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let matches: serde_json::Value = res.json().await.unwrap();
    assert_eq!(matches.as_array().unwrap().len(), 1);
    assert_eq!(matches[0]["title"], "Chess");

    // the original's /categories?c= search is the same filter
    let res = client
        .get(format!("{}/categories?c=GAME", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let matches: serde_json::Value = res.json().await.unwrap();
    assert_eq!(matches.as_array().unwrap().len(), 1);

    let res = client
        .get(format!("{}/market/category", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Category parameter is required");

    let res = client
        .get(format!("{}/categories", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Search query is required");
}

#[tokio::test]
async fn stock_purchase_decrements_and_rejects_overdraw() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let id = create_product(&client, &srv.base_url, "Chess", 1_000, 5, "games").await;

    let res = client
        .put(format!("{}/product?id={}", srv.base_url, id))
        .json(&json!({ "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Stock updated successfully");
    assert_eq!(body["newStock"], 3);

    // overdraw is rejected and the counter stays put
    let res = client
        .put(format!("{}/product?id={}", srv.base_url, id))
        .json(&json!({ "quantity": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(body["message"], "Insufficient stock");
    assert_eq!(product_stock(&client, &srv.base_url, &id).await, 3);

    let res = client
        .put(format!("{}/product?id={}", srv.base_url, id))
        .json(&json!({ "quantity": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Valid quantity is required");

    let res = client
        .put(format!("{}/product", srv.base_url))
        .json(&json!({ "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Product ID is required");
}

#[tokio::test]
async fn cart_endpoints_follow_the_inventory_contract() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register_user(&client, &srv.base_url, "u1").await;

    // unknown user is distinct from an empty cart
    let res = client
        .get(format!("{}/inventory?uid=ghost", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User not found");

    let res = client
        .get(format!("{}/inventory", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Missing uid");

    // add-or-increment: 2, then 2 more
    let body = add_inventory(
        &client,
        &srv.base_url,
        "u1",
        json!([{ "productId": "p1", "quantity": 2 }]),
    )
    .await;
    assert_eq!(body["message"], "1 items updated in inventory successfully");
    assert_eq!(body["inventory"]["p1"], 2);

    let body = add_inventory(
        &client,
        &srv.base_url,
        "u1",
        json!([{ "productId": "p1", "quantity": 2 }]),
    )
    .await;
    assert_eq!(body["inventory"]["p1"], 4);

    // malformed entries reject the whole batch
    let res = client
        .post(format!("{}/inventory", srv.base_url))
        .json(&json!({ "uid": "u1", "items": [{ "productId": "p2", "quantity": 0 }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Invalid item format. Each item must have productId and positive quantity"
    );
    assert_eq!(
        inventory_of(&client, &srv.base_url, "u1").await["p1"],
        4
    );

    // overwrite, then delete via quantity zero
    let res = client
        .put(format!("{}/inventory?uid=u1&productId=p1", srv.base_url))
        .json(&json!({ "quantity": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Inventory updated successfully");
    assert_eq!(body["inventory"]["p1"], 7);

    let res = client
        .put(format!("{}/inventory?uid=u1&productId=p1", srv.base_url))
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["inventory"].get("p1").is_none());

    let res = client
        .put(format!("{}/inventory?uid=u1&productId=p1", srv.base_url))
        .json(&json!({ "quantity": -2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Missing or invalid parameters");

    // removal is not idempotent: the second delete reports the miss
    add_inventory(
        &client,
        &srv.base_url,
        "u1",
        json!([{ "productId": "p3", "quantity": 1 }]),
    )
    .await;
    let res = client
        .delete(format!("{}/inventory?uid=u1&productId=p3", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Item removed from inventory successfully");

    let res = client
        .delete(format!("{}/inventory?uid=u1&productId=p3", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Product not found in inventory");

    let res = client
        .delete(format!("{}/inventory?uid=u1", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Missing parameters");
}

#[tokio::test]
async fn duplicate_user_registration_conflicts() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register_user(&client, &srv.base_url, "u1").await;

    let res = client
        .post(format!("{}/user", srv.base_url))
        .json(&json!({ "uid": "u1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(format!("{}/user", srv.base_url))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn order_endpoints_follow_the_ledger_contract() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/order", srv.base_url))
        .json(&json!({ "uid": "u1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Missing required fields: uid, items, or address");

    let res = client
        .post(format!("{}/order", srv.base_url))
        .json(&json!({ "uid": "u1", "items": {}, "address": address_body() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Order must contain at least one item");

    let res = client
        .post(format!("{}/order", srv.base_url))
        .json(&json!({
            "uid": "u1",
            "items": { "p1": 2 },
            "address": address_body(),
            "totalAmount": 2_000,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Order created successfully");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["totalAmount"], 2_000);
    let order_id = body["orderId"].as_str().unwrap().to_string();

    let res = client
        .get(format!("{}/order?uid=u1", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], order_id.as_str());
    assert_eq!(orders[0]["items"]["p1"], 2);

    let res = client
        .get(format!("{}/order", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Missing uid parameter");
}

#[tokio::test]
async fn best_effort_checkout_reports_per_line_and_keeps_failures_in_the_cart() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let p1 = create_product(&client, &srv.base_url, "Chess", 2_000, 5, "games").await;
    let p2 = create_product(&client, &srv.base_url, "Radio", 10_000, 0, "electronics").await;
    register_user(&client, &srv.base_url, "u1").await;
    add_inventory(
        &client,
        &srv.base_url,
        "u1",
        json!([
            { "productId": p1, "quantity": 2 },
            { "productId": p2, "quantity": 1 },
        ]),
    )
    .await;

    let res = client
        .post(format!("{}/checkout", srv.base_url))
        .json(&json!({
            "uid": "u1",
            "items": items_map(&[(&p1, 2), (&p2, 1)]),
            "address": address_body(),
            "totalAmount": 14_000,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let outcome: serde_json::Value = res.json().await.unwrap();
    assert_eq!(outcome["status"], "pending");
    assert_eq!(outcome["state"], "completed");
    assert_eq!(outcome["totalAmount"], 14_000);

    let line1 = line_for(&outcome, &p1);
    assert_eq!(line1["stock"], "applied");
    assert_eq!(line1["cart"], "applied");

    let line2 = line_for(&outcome, &p2);
    assert_eq!(line2["stock"], "failed");
    assert_eq!(line2["cart"], "skipped");
    assert!(line2["reason"]
        .as_str()
        .unwrap()
        .contains("insufficient stock"));

    // stock moved only for the line that succeeded
    assert_eq!(product_stock(&client, &srv.base_url, &p1).await, 3);
    assert_eq!(product_stock(&client, &srv.base_url, &p2).await, 0);

    // the failed line is still in the cart; the applied one is gone
    let inventory = inventory_of(&client, &srv.base_url, "u1").await;
    assert!(inventory.get(p1.as_str()).is_none());
    assert_eq!(inventory[p2.as_str()], 1);

    // the order carries both items and the computed total
    let res = client
        .get(format!("{}/order?uid=u1", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], outcome["orderId"]);
    assert_eq!(orders[0]["items"][p2.as_str()], 1);
}

#[tokio::test]
async fn atomic_checkout_aborts_restores_stock_and_cancels_the_order() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let p1 = create_product(&client, &srv.base_url, "Chess", 2_000, 5, "games").await;
    let p2 = create_product(&client, &srv.base_url, "Radio", 10_000, 0, "electronics").await;
    register_user(&client, &srv.base_url, "u1").await;
    add_inventory(
        &client,
        &srv.base_url,
        "u1",
        json!([
            { "productId": p1, "quantity": 2 },
            { "productId": p2, "quantity": 1 },
        ]),
    )
    .await;

    let res = client
        .post(format!("{}/checkout", srv.base_url))
        .json(&json!({
            "uid": "u1",
            "items": items_map(&[(&p1, 2), (&p2, 1)]),
            "address": address_body(),
            "mode": "atomic",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let outcome: serde_json::Value = res.json().await.unwrap();
    assert_eq!(outcome["error"], "insufficient_stock");
    assert_eq!(outcome["state"], "aborted");
    assert_eq!(outcome["status"], "cancelled");
    assert_eq!(line_for(&outcome, &p1)["stock"], "reverted");
    assert_eq!(line_for(&outcome, &p2)["stock"], "failed");

    // the applied decrement was restored and the cart never changed
    assert_eq!(product_stock(&client, &srv.base_url, &p1).await, 5);
    let inventory = inventory_of(&client, &srv.base_url, "u1").await;
    assert_eq!(inventory[p1.as_str()], 2);
    assert_eq!(inventory[p2.as_str()], 1);

    // the ledger keeps the cancelled order
    let res = client
        .get(format!("{}/order?uid=u1", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["status"], "cancelled");
}

#[tokio::test]
async fn checkout_rejects_a_total_that_disagrees_with_the_catalog() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let p1 = create_product(&client, &srv.base_url, "Chess", 2_000, 5, "games").await;
    register_user(&client, &srv.base_url, "u1").await;
    add_inventory(
        &client,
        &srv.base_url,
        "u1",
        json!([{ "productId": p1, "quantity": 2 }]),
    )
    .await;

    let res = client
        .post(format!("{}/checkout", srv.base_url))
        .json(&json!({
            "uid": "u1",
            "items": items_map(&[(&p1, 2)]),
            "address": address_body(),
            "totalAmount": 3_999,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    // rejected before the commit point: nothing moved anywhere
    let res = client
        .get(format!("{}/order?uid=u1", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["orders"].as_array().unwrap().is_empty());
    assert_eq!(product_stock(&client, &srv.base_url, &p1).await, 5);
    assert_eq!(
        inventory_of(&client, &srv.base_url, "u1").await[p1.as_str()],
        2
    );
}

#[tokio::test]
async fn checkout_requires_a_known_user_and_known_products() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let p1 = create_product(&client, &srv.base_url, "Chess", 2_000, 5, "games").await;

    let res = client
        .post(format!("{}/checkout", srv.base_url))
        .json(&json!({
            "uid": "ghost",
            "items": items_map(&[(&p1, 1)]),
            "address": address_body(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "user_not_found");

    register_user(&client, &srv.base_url, "u1").await;
    let res = client
        .post(format!("{}/checkout", srv.base_url))
        .json(&json!({
            "uid": "u1",
            "items": { "missing-product": 1 },
            "address": address_body(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "product_not_found");
    assert_eq!(product_stock(&client, &srv.base_url, &p1).await, 5);

    let res = client
        .post(format!("{}/checkout", srv.base_url))
        .json(&json!({
            "uid": "u1",
            "items": {},
            "address": address_body(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "empty_order");
}
