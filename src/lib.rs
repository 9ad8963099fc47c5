//! Invomail 前端应用
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `session`: 会话解析器（缓存 + 持久层 + 认证提供方）
//! - `guard`: 受保护路由的异步登录裁决
//! - `api`: 后端 REST 客户端
//! - `web::route` / `web::router`: 路由领域模型与 History 引擎
//! - `components`: UI 组件层（各自持有 loading/error/选择状态）

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
mod serde_helper;
pub mod session;
pub mod web;

mod components {
    pub mod connect_wizard;
    pub mod connected_accounts;
    pub mod dashboard;
    pub mod exports;
    mod icons;
    pub mod invoices;
    pub mod login;
    pub mod retrieval;
    pub mod rules;
    mod selection;
    pub mod signup;
    mod stats;
    pub mod suppliers;
}

use leptos::prelude::*;

use crate::api::ApiClient;
use crate::auth::init_session;
use crate::components::dashboard::DashboardPage;
use crate::components::login::LoginPage;
use crate::components::signup::SignupPage;
use crate::config::AppConfig;
use crate::guard::RequireAuth;
use crate::session::SessionGate;
use crate::web::route::AppRoute;
use crate::web::router::{Router, RouterOutlet};

/// 路由匹配函数：受保护子树套在 `RequireAuth` 里，
/// 每次进入都重新裁决。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Signup => view! { <SignupPage /> }.into_any(),
        AppRoute::Dashboard => view! {
            <RequireAuth>
                <DashboardPage />
            </RequireAuth>
        }
        .into_any(),
        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center min-h-screen bg-base-200">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Page not found"</p>
                </div>
            </div>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 配置与会话解析器
    let config = AppConfig::default();
    let (handle, session_ctx) = init_session();

    // 2. API 客户端（经由会话门取 token）
    let gate: std::sync::Arc<dyn SessionGate + Send + Sync> = handle.0.clone();
    let api = ApiClient::new(&config, gate);

    // 3. 注入 Context
    provide_context(config);
    provide_context(handle);
    provide_context(session_ctx);
    provide_context(api);

    view! {
        <Router>
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
