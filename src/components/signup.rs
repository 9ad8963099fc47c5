use leptos::prelude::*;
use leptos::task::spawn_local;

use invomail_shared::auth::SignupRequest;

use crate::auth::{use_api, use_auth};
use crate::components::login::is_valid_email;
use crate::components::icons::ShieldCheck;
use crate::web::route::AppRoute;
use crate::web::router::use_router;

#[component]
pub fn SignupPage() -> impl IntoView {
    let session_ctx = use_auth();
    let api = use_api();
    let router = use_router();

    let (name, set_name) = signal(String::new());
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (confirm, set_confirm) = signal(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (done_msg, set_done_msg) = signal(Option::<String>::None);

    // 已登录用户不该停留在注册页
    Effect::new(move |_| {
        if session_ctx.state.get().is_authenticated() {
            router.navigate(AppRoute::auth_success_redirect());
        }
    });

    let on_submit = {
        let api = api.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            set_error_msg.set(None);

            if !is_valid_email(&email.get()) {
                set_error_msg.set(Some("Enter a valid email".to_string()));
                return;
            }
            if password.get().len() < 8 {
                set_error_msg.set(Some("Password must be at least 8 characters".to_string()));
                return;
            }
            if password.get() != confirm.get() {
                set_error_msg.set(Some("Passwords do not match".to_string()));
                return;
            }

            set_is_submitting.set(true);
            let api = api.clone();
            spawn_local(async move {
                let trimmed = name.get_untracked().trim().to_string();
                let payload = SignupRequest {
                    email: email.get_untracked(),
                    password: password.get_untracked(),
                    name: (!trimmed.is_empty()).then_some(trimmed),
                };
                match api.signup(&payload).await {
                    Ok(response) => {
                        let message = response.message.unwrap_or_else(|| {
                            "Account created. Check your inbox to verify your email.".to_string()
                        });
                        set_done_msg.try_set(Some(message));
                    }
                    Err(err) => {
                        set_error_msg.try_set(Some(err.to_string()));
                    }
                }
                set_is_submitting.try_set(false);
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
                        <h1 class="text-3xl font-bold">"Create your account"</h1>
                    </div>
                </div>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <Show
                        when=move || done_msg.get().is_none()
                        fallback=move || {
                            view! {
                                <div class="card-body items-center text-center">
                                    <div role="alert" class="alert alert-success">
                                        <span>{move || done_msg.get().unwrap_or_default()}</span>
                                    </div>
                                    <button
                                        class="btn btn-primary mt-4"
                                        on:click=move |_| router.navigate(AppRoute::Login)
                                    >
                                        "Back to sign in"
                                    </button>
                                </div>
                            }
                        }
                    >
                        <form class="card-body" on:submit=on_submit.clone()>
                            <Show when=move || error_msg.get().is_some()>
                                <div role="alert" class="alert alert-error text-sm py-2">
                                    <span>{move || error_msg.get().unwrap_or_default()}</span>
                                </div>
                            </Show>

                            <div class="form-control">
                                <label class="label" for="name">
                                    <span class="label-text">"Name (optional)"</span>
                                </label>
                                <input
                                    id="name"
                                    type="text"
                                    on:input=move |ev| set_name.set(event_target_value(&ev))
                                    prop:value=name
                                    class="input input-bordered"
                                />
                            </div>
                            <div class="form-control">
                                <label class="label" for="signup-email">
                                    <span class="label-text">"Email"</span>
                                </label>
                                <input
                                    id="signup-email"
                                    type="email"
                                    on:input=move |ev| set_email.set(event_target_value(&ev))
                                    prop:value=email
                                    class="input input-bordered"
                                    required
                                />
                            </div>
                            <div class="form-control">
                                <label class="label" for="signup-password">
                                    <span class="label-text">"Password"</span>
                                </label>
                                <input
                                    id="signup-password"
                                    type="password"
                                    on:input=move |ev| set_password.set(event_target_value(&ev))
                                    prop:value=password
                                    class="input input-bordered"
                                    required
                                />
                            </div>
                            <div class="form-control">
                                <label class="label" for="signup-confirm">
                                    <span class="label-text">"Confirm password"</span>
                                </label>
                                <input
                                    id="signup-confirm"
                                    type="password"
                                    on:input=move |ev| set_confirm.set(event_target_value(&ev))
                                    prop:value=confirm
                                    class="input input-bordered"
                                    required
                                />
                            </div>
                            <div class="form-control mt-6">
                                <button class="btn btn-primary" disabled=move || is_submitting.get()>
                                    {move || if is_submitting.get() {
                                        view! { <span class="loading loading-spinner"></span> "Creating..." }.into_any()
                                    } else {
                                        "Sign up".into_any()
                                    }}
                                </button>
                            </div>

                            <p class="text-center text-sm text-base-content/60 mt-4">
                                "Already have an account? "
                                <a
                                    class="link link-primary"
                                    on:click=move |_| router.navigate(AppRoute::Login)
                                >
                                    "Sign in"
                                </a>
                            </p>
                        </form>
                    </Show>
                </div>
            </div>
        </div>
    }
}
