use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::ApiError;
use crate::auth::{login, start_google_oauth, use_api, use_auth, use_session};
use crate::components::icons::{Mail, ShieldCheck};
use crate::web::route::AppRoute;
use crate::web::router::use_router;

/// 登录失败的文案分流：401 与「邮箱未验证」的 403 单独措辞
pub(crate) fn login_error_message(err: &ApiError) -> String {
    match err.status() {
        Some(401) => "Invalid email or password".to_string(),
        Some(403) if err.error_code() == Some("email_not_confirmed") => {
            "Please verify your email before logging in. Check your inbox.".to_string()
        }
        _ => err.to_string(),
    }
}

/// 客户端侧的邮箱格式预检查；不通过则请求根本不会发出
pub(crate) fn is_valid_email(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((head, tail)) => !head.is_empty() && !tail.is_empty(),
        None => false,
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let session_ctx = use_auth();
    let handle = use_session();
    let api = use_api();
    let router = use_router();

    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (show_password, set_show_password) = signal(false);
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (notice, set_notice) = signal(Option::<String>::None);

    // 已登录（或存储里有登录痕迹）则直接进控制台
    {
        let handle = handle.clone();
        Effect::new(move |_| {
            if session_ctx.state.get().is_authenticated() || handle.0.any_persisted_signal() {
                router.navigate(AppRoute::auth_success_redirect());
            }
        });
    }

    // 后端 Google OAuth 可用性（决定按钮是否亮起）
    let (google_enabled, set_google_enabled) = signal(false);
    {
        let api = api.clone();
        Effect::new(move |_| {
            let api = api.clone();
            spawn_local(async move {
                match api.google_status().await {
                    Ok(status) => {
                        set_google_enabled.try_set(status.enabled);
                    }
                    Err(_) => {
                        set_google_enabled.try_set(false);
                    }
                }
            });
        });
    }

    let on_submit = {
        let handle = handle.clone();
        let api = api.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            set_error_msg.set(None);

            if !is_valid_email(&email.get()) {
                set_error_msg.set(Some("Enter a valid email".to_string()));
                return;
            }
            if password.get().is_empty() {
                set_error_msg.set(Some("Enter your password".to_string()));
                return;
            }

            set_is_submitting.set(true);
            let handle = handle.clone();
            let api = api.clone();
            spawn_local(async move {
                match login(&handle, &api, email.get_untracked(), password.get_untracked()).await {
                    Ok(()) => router.navigate(AppRoute::auth_success_redirect()),
                    Err(err) => {
                        set_error_msg.try_set(Some(login_error_message(&err)));
                    }
                }
                set_is_submitting.try_set(false);
            });
        }
    };

    let on_google = {
        let handle = handle.clone();
        let api = api.clone();
        move |_| {
            let handle = handle.clone();
            let api = api.clone();
            spawn_local(async move {
                start_google_oauth(&handle, &api).await;
            });
        }
    };

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <div class="text-center mb-4">
                    <div class="flex flex-col items-center gap-2">
                        <div class="p-3 bg-primary/10 rounded-2xl text-primary">
                            <ShieldCheck attr:class="h-8 w-8" />
                        </div>
                        <h1 class="text-3xl font-bold">"Mail Invoices"</h1>
                        <p class="text-base-content/70">"Enter your login details to sign in"</p>
                    </div>
                </div>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <form class="card-body" on:submit=on_submit>
                        <Show when=move || error_msg.get().is_some()>
                            <div role="alert" class="alert alert-error text-sm py-2">
                                <span>{move || error_msg.get().unwrap_or_default()}</span>
                            </div>
                        </Show>
                        <Show when=move || notice.get().is_some()>
                            <div role="alert" class="alert alert-info text-sm py-2">
                                <span>{move || notice.get().unwrap_or_default()}</span>
                            </div>
                        </Show>

                        <div class="form-control">
                            <label class="label" for="email">
                                <span class="label-text">"Email"</span>
                            </label>
                            <input
                                id="email"
                                type="email"
                                placeholder="example@gmail.com"
                                on:input=move |ev| set_email.set(event_target_value(&ev))
                                prop:value=email
                                class="input input-bordered"
                                required
                            />
                        </div>
                        <div class="form-control">
                            <label class="label" for="password">
                                <span class="label-text">"Password"</span>
                            </label>
                            <div class="join w-full">
                                <input
                                    id="password"
                                    type=move || if show_password.get() { "text" } else { "password" }
                                    placeholder="••••••••"
                                    on:input=move |ev| set_password.set(event_target_value(&ev))
                                    prop:value=password
                                    class="input input-bordered join-item w-full"
                                    required
                                />
                                <button
                                    type="button"
                                    class="btn join-item"
                                    on:click=move |_| set_show_password.update(|v| *v = !*v)
                                >
                                    {move || if show_password.get() { "Hide" } else { "Show" }}
                                </button>
                            </div>
                        </div>
                        <div class="form-control mt-6">
                            <button class="btn btn-primary" disabled=move || is_submitting.get()>
                                {move || if is_submitting.get() {
                                    view! { <span class="loading loading-spinner"></span> "Signing in..." }.into_any()
                                } else {
                                    "Sign in".into_any()
                                }}
                            </button>
                        </div>

                        <div class="divider text-sm text-base-content/50">"Or continue with"</div>
                        <div class="flex justify-center gap-2">
                            <button
                                type="button"
                                class="btn btn-outline gap-2"
                                disabled=move || !google_enabled.get()
                                on:click=on_google
                            >
                                <Mail attr:class="h-4 w-4" /> "Google"
                            </button>
                            <button
                                type="button"
                                class="btn btn-outline"
                                on:click=move |_| set_notice.set(Some("Outlook login will be available soon.".into()))
                            >
                                "Outlook"
                            </button>
                        </div>

                        <p class="text-center text-sm text-base-content/60 mt-4">
                            "Don't have an account yet? "
                            <a
                                class="link link-primary"
                                on:click=move |_| router.navigate(AppRoute::Signup)
                            >
                                "Sign up"
                            </a>
                        </p>
                    </form>
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_invalid_credentials() {
        // 401 且无响应体：仍然是「账号或密码错误」
        let err = ApiError::Status {
            status: 401,
            message: "Unauthorized".into(),
            body: None,
        };
        assert_eq!(login_error_message(&err), "Invalid email or password");
    }

    #[test]
    fn unverified_email_gets_tailored_message() {
        let err = ApiError::Status {
            status: 403,
            message: "Forbidden".into(),
            body: Some(serde_json::json!({ "code": "email_not_confirmed" })),
        };
        assert!(login_error_message(&err).contains("verify your email"));
    }

    #[test]
    fn other_errors_surface_their_own_message() {
        let err = ApiError::Status {
            status: 500,
            message: "Internal Server Error".into(),
            body: None,
        };
        assert_eq!(login_error_message(&err), "Internal Server Error");
        assert_eq!(login_error_message(&ApiError::Timeout), "request timed out");
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at.example.com"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user name@example.com"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@example."));
    }
}
