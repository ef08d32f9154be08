// tests/persistencia.rs
// Comportamentos que dependem do banco. Cada teste recebe um banco novo com
// as migrações aplicadas (DATABASE_URL aponta para o servidor de testes).

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use sge_backend::{
    config::{AppState, Config},
    db::UsuarioRepository,
    routes,
    services::notificacao::Notificacoes,
};

fn app(pool: PgPool) -> Router {
    let config = Config {
        database_url: String::new(),
        jwt_secret: "segredo-de-teste".into(),
        port: 0,
        database_max_connections: 1,
        email: None,
        evolution: None,
    };
    routes::app(AppState::from_pool(pool, &config, Notificacoes::default()))
}

async fn enviar(
    pool: &PgPool,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    corpo: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (nome, valor) in headers {
        builder = builder.header(*nome, *valor);
    }
    let body = match corpo {
        Some(corpo) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(corpo.to_string())
        }
        None => Body::empty(),
    };

    let response = app(pool.clone()).oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn post(pool: &PgPool, uri: &str, corpo: Value) -> (StatusCode, Value) {
    enviar(pool, Method::POST, uri, &[], Some(corpo)).await
}

async fn contar(pool: &PgPool, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await.unwrap()
}

// ---
// Contagens
// ---

#[sqlx::test(migrations = "./migrations")]
async fn sync_repetido_grava_duas_leituras(pool: PgPool) {
    let leitura = json!({"cod_loja": 1, "cod_usuario": 3, "itens": [{"cod_produto": 10, "qtde": 4}]});

    for _ in 0..2 {
        let (status, corpo) = post(&pool, "/contagens/sync", leitura.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(corpo["inseridos"], 1);
    }

    assert_eq!(contar(&pool, "SELECT COUNT(*) FROM contagens WHERE cod_loja = 1").await, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn pendentes_entrega_cada_leitura_uma_vez(pool: PgPool) {
    post(
        &pool,
        "/contagens/sync",
        json!({"cod_loja": 1, "cod_usuario": 3, "itens": [
            {"cod_produto": 10, "qtde": 4},
            {"cod_produto": 11, "qtde": 1.5}
        ]}),
    )
    .await;
    post(
        &pool,
        "/contagens/sync",
        json!({"cod_loja": 2, "cod_usuario": 8, "itens": [{"cod_produto": 10, "qtde": 9}]}),
    )
    .await;

    let (status, primeira) = enviar(&pool, Method::GET, "/contagens/pendentes?cod_loja=1", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(primeira["total"], 2);
    assert!(primeira["lote"].is_string());
    assert!(primeira["data"].as_array().unwrap().iter().all(|c| c["sincronizado"] == true));

    let (_, segunda) = enviar(&pool, Method::GET, "/contagens/pendentes?cod_loja=1", &[], None).await;
    assert_eq!(segunda["total"], 0);
    assert!(segunda["lote"].is_null());

    // Outra loja não é afetada.
    let (_, outra) = enviar(&pool, Method::GET, "/contagens/pendentes?cod_loja=2", &[], None).await;
    assert_eq!(outra["total"], 1);
}

// ---
// Cadastro em lote
// ---

#[sqlx::test(migrations = "./migrations")]
async fn array_de_produtos_e_autoritativo_para_a_loja(pool: PgPool) {
    let (status, corpo) = post(
        &pool,
        "/produtos/cadastrar",
        json!([
            {"cod_loja": 1, "codigo": 100, "nome": "Arroz", "unidade_medida": "UN", "eans": ["7890000000011", "7890000000028"]},
            {"cod_loja": 1, "codigo": 101, "nome": "Feijao", "unidade_medida": "UN"}
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(corpo["inseridos"], 2);
    assert_eq!(corpo["removidos"], 0);

    let so_o_100 = json!([
        {"cod_loja": 1, "codigo": 100, "nome": "Arroz", "unidade_medida": "UN", "eans": ["7890000000028", "7890000000035"]}
    ]);
    let (_, corpo) = post(&pool, "/produtos/cadastrar", so_o_100.clone()).await;
    assert_eq!(corpo["inseridos"], 0);
    assert_eq!(corpo["atualizados"], 1);
    assert_eq!(corpo["removidos"], 1);

    let codigos: Vec<i32> = sqlx::query_scalar("SELECT codigo FROM produtos WHERE cod_loja = 1 ORDER BY codigo")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(codigos, vec![100]);

    let eans: Vec<String> = sqlx::query_scalar(
        "SELECT codigo_barras FROM eans WHERE cod_loja = 1 AND cod_produto = 100 ORDER BY codigo_barras",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(eans, vec!["7890000000028".to_string(), "7890000000035".to_string()]);
    assert_eq!(contar(&pool, "SELECT COUNT(*) FROM eans WHERE cod_produto = 101").await, 0);

    let (status, corpo) = post(&pool, "/produtos/cadastrar", so_o_100).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(corpo["inseridos"], 0);
    assert_eq!(corpo["atualizados"], 0);
    assert_eq!(corpo["removidos"], 0);
}

// ---
// Webhook
// ---

#[sqlx::test(migrations = "./migrations")]
async fn webhook_sem_texto_nem_midia_nao_grava_mensagem(pool: PgPool) {
    let (status, _) = post(
        &pool,
        "/lojas/cadastrar",
        json!({"codigo": 1, "nome": "Centro", "cidade": "Campinas", "evolution_apikey": "CHAVE-LOJA-1"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let apikey = [("apikey", "CHAVE-LOJA-1")];
    let evento = |message: Value| {
        json!({
            "event": "messages.upsert",
            "instance": "centro",
            "data": {
                "key": {"remoteJid": "5519988887777@s.whatsapp.net", "fromMe": false, "id": "EXT-1"},
                "pushName": "Carla",
                "message": message
            }
        })
    };

    let (status, _) = enviar(
        &pool,
        Method::POST,
        "/mensagens/webhook",
        &apikey,
        Some(evento(json!({"conversation": "Bom dia"}))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(contar(&pool, "SELECT COUNT(*) FROM mensagens").await, 1);

    let (status, corpo) = enviar(
        &pool,
        Method::POST,
        "/mensagens/webhook",
        &apikey,
        Some(evento(json!({"reactionMessage": {"text": ""}}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corpo["ignorado"], true);
    assert_eq!(contar(&pool, "SELECT COUNT(*) FROM mensagens").await, 1);
}

// ---
// Recuperação de senha
// ---

async fn dois_usuarios(pool: &PgPool) -> (i32, i32) {
    sqlx::query("INSERT INTO lojas (codigo, nome, cidade) VALUES (1, 'Centro', 'Campinas')")
        .execute(pool)
        .await
        .unwrap();
    let ids: Vec<i32> = sqlx::query_scalar(
        "INSERT INTO usuarios (codigo, cod_loja, nome) VALUES (1, 1, 'Ana'), (2, 1, 'Bruno') RETURNING id",
    )
    .fetch_all(pool)
    .await
    .unwrap();
    (ids[0], ids[1])
}

#[sqlx::test(migrations = "./migrations")]
async fn codigo_de_recuperacao_pertence_a_um_so_usuario(pool: PgPool) {
    let (ana, bruno) = dois_usuarios(&pool).await;
    let repo = UsuarioRepository::new(pool.clone());
    let expira_em = Utc::now() + Duration::minutes(15);

    assert!(repo.criar_token(ana, "123456", expira_em).await.unwrap().is_some());
    assert!(repo.criar_token(bruno, "123456", expira_em).await.unwrap().is_none());

    let token = repo.buscar_token(&pool, "123456").await.unwrap().unwrap();
    assert_eq!(token.id_usuario, ana);

    // Novo código da Ana invalida o anterior e libera o número.
    assert!(repo.criar_token(ana, "654321", expira_em).await.unwrap().is_some());
    assert_eq!(contar(&pool, &format!("SELECT COUNT(*) FROM tokens_recuperacao WHERE id_usuario = {ana}")).await, 1);
    assert!(repo.buscar_token(&pool, "123456").await.unwrap().is_none());

    assert!(repo.criar_token(bruno, "123456", expira_em).await.unwrap().is_some());
    let token = repo.buscar_token(&pool, "123456").await.unwrap().unwrap();
    assert_eq!(token.id_usuario, bruno);
}

#[sqlx::test(migrations = "./migrations")]
async fn codigo_expirado_e_liberado_na_proxima_emissao(pool: PgPool) {
    let (ana, bruno) = dois_usuarios(&pool).await;
    let repo = UsuarioRepository::new(pool.clone());

    assert!(repo
        .criar_token(ana, "111111", Utc::now() - Duration::minutes(1))
        .await
        .unwrap()
        .is_some());

    assert!(repo
        .criar_token(bruno, "111111", Utc::now() + Duration::minutes(15))
        .await
        .unwrap()
        .is_some());
    let token = repo.buscar_token(&pool, "111111").await.unwrap().unwrap();
    assert_eq!(token.id_usuario, bruno);
}

#[sqlx::test(migrations = "./migrations")]
async fn redefinir_com_codigo_de_outro_usuario_so_afeta_o_dono(pool: PgPool) {
    let (ana, bruno) = dois_usuarios(&pool).await;
    let repo = UsuarioRepository::new(pool.clone());
    let expira_em = Utc::now() + Duration::minutes(15);
    repo.criar_token(ana, "222222", expira_em).await.unwrap();
    repo.criar_token(bruno, "333333", expira_em).await.unwrap();

    let (status, _) = post(
        &pool,
        "/auth/reset-password",
        json!({"token": "222222", "nova_senha_md5": "e10adc3949ba59abbe56e057f20f883e"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let senhas: Vec<Option<String>> = sqlx::query_scalar("SELECT senha_md5 FROM usuarios ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(senhas, vec![Some("e10adc3949ba59abbe56e057f20f883e".to_string()), None]);

    let (status, _) = post(
        &pool,
        "/auth/reset-password",
        json!({"token": "222222", "nova_senha_md5": "abc"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
