//! Router tests: requests go through the full axum stack against an
//! in-memory SQLite store and an in-memory blob store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::{Local, Months};
use serde_json::{Value, json};
use terra_core::blob::MemoryBlobStore;
use terra_store_sqlite::SqliteStore;
use tower::ServiceExt as _;

use crate::api_router;

const BOUNDARY: &str = "terra-test-boundary";

struct TestApp {
  router: Router,
  blobs:  Arc<MemoryBlobStore>,
}

async fn test_app() -> TestApp {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let blobs = Arc::new(MemoryBlobStore::new("http://blobs.test"));
  TestApp { router: api_router(Arc::new(store), Arc::clone(&blobs)), blobs }
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
  axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap()
    .to_vec()
}

impl TestApp {
  async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
    let resp = self.router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = body_bytes(resp).await;
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
  }

  async fn json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    self.send(req).await
  }

  async fn get(&self, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    self.send(req).await
  }

  async fn delete(&self, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
      .method("DELETE")
      .uri(uri)
      .body(Body::empty())
      .unwrap();
    self.send(req).await
  }

  /// `POST /territorios` as multipart; `image` is `(filename, bytes)`.
  async fn create_territory(
    &self,
    fields: &[(&str, &str)],
    image: Option<(&str, &[u8])>,
  ) -> (StatusCode, Value) {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
      body.extend_from_slice(
        format!(
          "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
        .as_bytes(),
      );
    }
    if let Some((filename, content)) = image {
      body.extend_from_slice(
        format!(
          "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"imagem\"; \
           filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
      );
      body.extend_from_slice(content);
      body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let req = Request::builder()
      .method("POST")
      .uri("/territorios")
      .header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
      )
      .body(Body::from(body))
      .unwrap();
    self.send(req).await
  }

  async fn territory(&self, number: &str, description: &str) -> i64 {
    let (status, body) = self
      .create_territory(&[("numero", number), ("descricao", description)], None)
      .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
  }

  async fn person(&self, name: &str) -> i64 {
    let (status, body) = self.json("POST", "/pessoas", json!({ "nome": name })).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
  }
}

// ─── Root ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn root_reports_liveness() {
  let app = test_app().await;
  let (status, body) = app.get("/").await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["message"].as_str().unwrap().contains("no ar"));
}

// ─── Assignment lifecycle ────────────────────────────────────────────────────

#[tokio::test]
async fn territory_twelve_scenario() {
  let app = test_app().await;
  let t12 = app.territory("12", "Rua das Flores").await;
  let maria = app.person("Maria").await;
  let joao = app.person("João").await;

  let (status, body) = app
    .json(
      "POST",
      "/designacoes",
      json!({ "territorio_id": t12, "pessoa_id": maria, "data_saida": "2025-01-10" }),
    )
    .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  assert_eq!(body["territorio_id"], t12);
  assert!(body["data_devolucao"].is_null());

  let (_, list) = app.get("/territorios").await;
  assert_eq!(list[0]["status"], "Em campo");
  assert_eq!(list[0]["pessoa_nome"], "Maria");

  let (status, body) = app
    .json(
      "POST",
      "/designacoes",
      json!({ "territorio_id": t12, "pessoa_id": joao, "data_saida": "2025-01-11" }),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("not available"));

  let (status, body) = app
    .json(
      "PUT",
      "/designacoes/devolver",
      json!({ "territorio_id": t12, "data_devolucao": "2025-02-01" }),
    )
    .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["data_saida"], "2025-01-10");
  assert_eq!(body["data_devolucao"], "2025-02-01");

  let (status, list) = app.get("/territorios?search=12").await;
  assert_eq!(status, StatusCode::OK);
  let rows = list.as_array().unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0]["status"], "Disponível");
  assert_eq!(rows[0]["ultima_devolucao"], "2025-02-01");
  assert!(rows[0]["pessoa_nome"].is_null());
}

#[tokio::test]
async fn return_without_open_assignment_is_404() {
  let app = test_app().await;
  let t = app.territory("1", "Centro").await;
  let (status, _) = app
    .json(
      "PUT",
      "/designacoes/devolver",
      json!({ "territorio_id": t, "data_devolucao": "2025-02-01" }),
    )
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lifecycle_requires_fields() {
  let app = test_app().await;
  let (status, _) = app
    .json("PUT", "/designacoes/devolver", json!({ "territorio_id": 1 }))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = app
    .json("POST", "/designacoes", json!({ "territorio_id": 1, "data_saida": "2025-01-10" }))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("pessoa_id"));
}

#[tokio::test]
async fn malformed_requests_get_json_400() {
  let app = test_app().await;
  let (status, body) = app
    .json(
      "POST",
      "/designacoes",
      json!({ "territorio_id": "1", "pessoa_id": 1, "data_saida": "2025-01-10" }),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("territorio_id"), "{body}");

  let (status, body) = app
    .json(
      "POST",
      "/designacoes",
      json!({ "territorio_id": 1, "pessoa_id": 1, "data_saida": "2025-01-10T09:00:00" }),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let req = Request::builder()
    .method("POST")
    .uri("/pessoas")
    .body(Body::from("nome=Ana"))
    .unwrap();
  let (status, body) = app.send(req).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let (status, body) = app.delete("/pessoas/abc").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn assign_unknown_territory_is_404() {
  let app = test_app().await;
  let maria = app.person("Maria").await;
  let (status, _) = app
    .json(
      "POST",
      "/designacoes",
      json!({ "territorio_id": 77, "pessoa_id": maria, "data_saida": "2025-01-10" }),
    )
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── People ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn deleting_a_holder_is_refused_until_return() {
  let app = test_app().await;
  let t12 = app.territory("12", "Rua das Flores").await;
  let maria = app.person("Maria").await;
  app
    .json(
      "POST",
      "/designacoes",
      json!({ "territorio_id": t12, "pessoa_id": maria, "data_saida": "2025-01-10" }),
    )
    .await;

  let (status, _) = app.delete(&format!("/pessoas/{maria}")).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  app
    .json(
      "PUT",
      "/designacoes/devolver",
      json!({ "territorio_id": t12, "data_devolucao": "2025-02-01" }),
    )
    .await;
  let (status, body) = app.delete(&format!("/pessoas/{maria}")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["nome"], "Maria");
}

#[tokio::test]
async fn people_crud() {
  let app = test_app().await;
  let (status, _) = app.json("POST", "/pessoas", json!({ "email": "x@y.z" })).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let id = app.person("Zé").await;
  app.person("Ana").await;
  let (_, people) = app.get("/pessoas").await;
  assert_eq!(people[0]["nome"], "Ana");

  let (status, body) = app
    .json("PUT", &format!("/pessoas/{id}"), json!({ "nome": "José", "telefone": "123" }))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["telefone"], "123");

  let (status, _) = app.json("PUT", "/pessoas/999", json!({ "nome": "X" })).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = app.delete("/pessoas/999").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Territories ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_territory_with_image_stores_blob() {
  let app = test_app().await;
  let (status, body) = app
    .create_territory(
      &[("numero", "7"), ("descricao", "Vila Nova"), ("tipo", "urbano")],
      Some(("mapa.PNG", b"\x89PNG fake")),
    )
    .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  assert_eq!(body["status"], "Disponível");
  assert_eq!(body["tipo"], "urbano");

  let url = body["url_imagem"].as_str().unwrap();
  assert!(url.starts_with("http://blobs.test/mapas/mapa-"), "{url}");
  assert!(url.ends_with(".png"), "{url}");
  assert_eq!(app.blobs.get(url).as_deref(), Some(&b"\x89PNG fake"[..]));
}

#[tokio::test]
async fn create_territory_requires_number_and_description() {
  let app = test_app().await;
  let (status, _) = app
    .create_territory(&[("numero", "7")], Some(("mapa.png", b"png")))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(app.blobs.is_empty());

  let (status, body) = app.create_territory(&[("descricao", "Sem número")], None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("numero"));
}

#[tokio::test]
async fn update_and_delete_territory() {
  let app = test_app().await;
  let t = app.territory("1", "Centro").await;
  let maria = app.person("Maria").await;

  let (status, body) = app
    .json(
      "PUT",
      &format!("/territorios/{t}"),
      json!({ "numero": "1A", "descricao": "Centro velho", "status": "Em campo" }),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["numero"], "1A");
  assert_eq!(body["status"], "Disponível");

  let (status, _) = app.json("PUT", &format!("/territorios/{t}"), json!({})).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  app
    .json(
      "POST",
      "/designacoes",
      json!({ "territorio_id": t, "pessoa_id": maria, "data_saida": "2025-01-10" }),
    )
    .await;
  let (status, _) = app.delete(&format!("/territorios/{t}")).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  app
    .json(
      "PUT",
      "/designacoes/devolver",
      json!({ "territorio_id": t, "data_devolucao": "2025-01-20" }),
    )
    .await;
  let (status, body) = app.delete(&format!("/territorios/{t}")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["id"], t);
  let (status, _) = app.delete(&format!("/territorios/{t}")).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_by_status_and_rejects_unknown_status() {
  let app = test_app().await;
  let t1 = app.territory("1", "A").await;
  app.territory("2", "B").await;
  let maria = app.person("Maria").await;
  app
    .json(
      "POST",
      "/designacoes",
      json!({ "territorio_id": t1, "pessoa_id": maria, "data_saida": "2025-01-10" }),
    )
    .await;

  let (status, list) = app.get("/territorios?status=Dispon%C3%ADvel").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list.as_array().unwrap().len(), 1);
  assert_eq!(list[0]["numero"], "2");

  let (status, _) = app.get("/territorios?status=perdido").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn history_lists_every_territory() {
  let app = test_app().await;
  let t1 = app.territory("1", "A").await;
  app.territory("2", "B").await;
  let maria = app.person("Maria").await;
  app
    .json(
      "POST",
      "/designacoes",
      json!({ "territorio_id": t1, "pessoa_id": maria, "data_saida": "2025-01-10" }),
    )
    .await;

  let (status, history) = app.get("/historico-completo").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(history.as_array().unwrap().len(), 2);
  assert_eq!(history[0]["historico"][0]["pessoa_nome"], "Maria");
  assert!(history[0]["historico"][0]["data_devolucao"].is_null());
  assert_eq!(history[1]["historico"], json!([]));
}

#[tokio::test]
async fn csv_export_has_bom_header_and_rows() {
  let app = test_app().await;
  app.territory("2", "Rua \"B\"").await;
  app.territory("1", "Rua A").await;

  let req = Request::builder()
    .uri("/territorios/export")
    .body(Body::empty())
    .unwrap();
  let resp = app.router.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(
    resp.headers()[header::CONTENT_TYPE],
    "text/csv; charset=utf-8"
  );
  let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_owned();
  assert!(disposition.starts_with("attachment; filename=\"S-13_Relatorio_Territorios_"));

  let text = String::from_utf8(body_bytes(resp).await).unwrap();
  assert!(text.starts_with('\u{FEFF}'));
  let lines: Vec<&str> = text.trim_start_matches('\u{FEFF}').lines().collect();
  assert_eq!(lines.len(), 3);
  assert!(lines[0].starts_with("Número do Território;"));
  assert_eq!(lines[1], "1;\"Rua A\";;Disponível;;;");
  assert_eq!(lines[2], "2;\"Rua \"\"B\"\"\";;Disponível;;;");
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn dashboard_flags_overdue_territories() {
  let app = test_app().await;
  let old = app.territory("1", "A").await;
  let recent = app.territory("2", "B").await;
  app.territory("3", "C").await;
  let maria = app.person("Maria").await;

  let today = Local::now().date_naive();
  let five_months_ago = today.checked_sub_months(Months::new(5)).unwrap();
  let one_month_ago = today.checked_sub_months(Months::new(1)).unwrap();
  for (territory, date) in [(old, five_months_ago), (recent, one_month_ago)] {
    let (status, _) = app
      .json(
        "POST",
        "/designacoes",
        json!({ "territorio_id": territory, "pessoa_id": maria, "data_saida": date }),
      )
      .await;
    assert_eq!(status, StatusCode::CREATED);
  }

  let (status, stats) = app.get("/dashboard/stats").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(stats["counts"], json!({ "total": 3, "em_campo": 2, "disponivel": 1 }));

  let overdue = stats["overdueTerritories"].as_array().unwrap();
  assert_eq!(overdue.len(), 1);
  assert_eq!(overdue[0]["id"], old);
  assert_eq!(overdue[0]["pessoa_nome"], "Maria");

  let suggestions = stats["assignmentSuggestions"].as_array().unwrap();
  assert_eq!(suggestions.len(), 1);
  assert_eq!(suggestions[0]["numero"], "3");
}

// ─── Groups ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn groups_crud_and_association() {
  let app = test_app().await;
  let t1 = app.territory("1", "A").await;
  let t2 = app.territory("2", "B").await;

  let (status, group) = app.json("POST", "/grupos", json!({ "nome": "Norte" })).await;
  assert_eq!(status, StatusCode::CREATED);
  let gid = group["id"].as_i64().unwrap();

  let (status, _) = app.json("POST", "/grupos", json!({ "nome": "Norte" })).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (status, _) = app.json("POST", "/grupos", json!({ "nome": "" })).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = app
    .json(
      "PUT",
      &format!("/grupos/{gid}/associar-territorios"),
      json!({ "territorio_ids": [t2, t1] }),
    )
    .await;
  assert_eq!(status, StatusCode::OK);

  let (_, groups) = app.get("/grupos").await;
  assert_eq!(groups[0]["territorio_ids"], json!([t1, t2]));

  let (_, list) = app.get("/territorios").await;
  assert_eq!(list[0]["grupo_nome"], "Norte");

  let (status, renamed) = app
    .json("PUT", &format!("/grupos/{gid}"), json!({ "nome": "Sul" }))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(renamed["nome"], "Sul");

  let (status, _) = app.delete(&format!("/grupos/{gid}")).await;
  assert_eq!(status, StatusCode::OK);
  let (_, list) = app.get("/territorios").await;
  assert!(list[0]["grupo_id"].is_null());

  let (status, _) = app.delete(&format!("/grupos/{gid}")).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = app
    .json(
      "PUT",
      &format!("/grupos/{gid}/associar-territorios"),
      json!({ "territorio_ids": [t1] }),
    )
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Campaigns ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn campaigns_report_progress() {
  let app = test_app().await;
  let t1 = app.territory("1", "A").await;
  app.territory("2", "B").await;
  let maria = app.person("Maria").await;

  let (status, _) = app
    .json("POST", "/campanhas", json!({ "titulo": "Especial" }))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, campaign) = app
    .json(
      "POST",
      "/campanhas",
      json!({ "titulo": "Especial", "data_inicio": "2025-03-01", "data_fim": "2025-03-31" }),
    )
    .await;
  assert_eq!(status, StatusCode::CREATED);
  let cid = campaign["id"].as_i64().unwrap();

  app
    .json(
      "POST",
      "/designacoes",
      json!({
        "territorio_id": t1,
        "pessoa_id": maria,
        "data_saida": "2025-03-02",
        "campanha_id": cid,
      }),
    )
    .await;

  let (_, campaigns) = app.get("/campanhas").await;
  assert_eq!(campaigns[0]["titulo"], "Especial");
  assert_eq!(campaigns[0]["trabalhados_count"], 1);
  assert_eq!(campaigns[0]["total_territorios"], 2);
  assert_eq!(campaigns[0]["faltam_count"], 1);

  let (_, remaining) = app
    .get(&format!("/territorios?nao_trabalhado_na_campanha={cid}"))
    .await;
  assert_eq!(remaining.as_array().unwrap().len(), 1);
  assert_eq!(remaining[0]["numero"], "2");

  let (status, updated) = app
    .json(
      "PUT",
      &format!("/campanhas/{cid}"),
      json!({ "titulo": "Especial 2", "data_inicio": "2025-03-01", "data_fim": "2025-04-30" }),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["data_fim"], "2025-04-30");

  let (status, _) = app.delete(&format!("/campanhas/{cid}")).await;
  assert_eq!(status, StatusCode::OK);
  let (_, history) = app.get("/historico-completo").await;
  assert_eq!(history[0]["historico"].as_array().unwrap().len(), 1);
  let (status, _) = app.delete(&format!("/campanhas/{cid}")).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
