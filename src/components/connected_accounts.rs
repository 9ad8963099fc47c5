use leptos::prelude::*;
use leptos::task::spawn_local;

use invomail_shared::Account;

use crate::auth::use_api;
use crate::components::connect_wizard::ConnectWizard;
use crate::components::icons::{Plus, RefreshCw, Trash2};

/// 浏览器原生确认框；拿不到 window 视为取消
fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// 账号区：列表与接入向导二选一展示
#[component]
pub fn AccountsSection() -> impl IntoView {
    let (show_wizard, set_show_wizard) = signal(false);

    view! {
        <Show
            when=move || show_wizard.get()
            fallback=move || {
                view! { <ConnectedAccounts on_connect_new=move |_| set_show_wizard.set(true) /> }
            }
        >
            <ConnectWizard on_exit=move |_| set_show_wizard.set(false) />
        </Show>
    }
}

#[component]
fn ConnectedAccounts(#[prop(into)] on_connect_new: Callback<()>) -> impl IntoView {
    let api = use_api();

    let (accounts, set_accounts) = signal(Vec::<Account>::new());
    let (loading, set_loading) = signal(true);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let load_accounts = {
        let api = api.clone();
        move || {
            let api = api.clone();
            set_loading.set(true);
            set_error_msg.set(None);
            spawn_local(async move {
                match api.list_accounts().await {
                    Ok(data) => {
                        set_accounts.try_set(data);
                    }
                    Err(err) => {
                        set_error_msg.try_set(Some(format!("Failed to load accounts: {err}")));
                    }
                }
                set_loading.try_set(false);
            });
        }
    };

    // 初始加载
    {
        let load_accounts = load_accounts.clone();
        Effect::new(move |_| {
            load_accounts();
        });
    }

    let handle_remove = {
        let api = api.clone();
        let load_accounts = load_accounts.clone();
        move |id: String| {
            if !confirm("Are you sure you want to remove this account?") {
                return;
            }
            let api = api.clone();
            let load_accounts = load_accounts.clone();
            spawn_local(async move {
                match api.delete_account(&id).await {
                    Ok(()) => load_accounts(),
                    Err(err) => {
                        set_error_msg.try_set(Some(format!("Error removing account: {err}")));
                    }
                }
            });
        }
    };

    let status_class = |status: &str| match status.to_ascii_lowercase().as_str() {
        "connected" => "badge badge-success badge-outline",
        "error" => "badge badge-error badge-outline",
        "pending" => "badge badge-warning badge-outline",
        _ => "badge badge-ghost",
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <div class="flex items-center justify-between">
                    <div>
                        <h2 class="card-title">"Connected Accounts"</h2>
                        <p class="text-base-content/70 text-sm">
                            "Mailboxes scanned for incoming invoices."
                        </p>
                    </div>
                    <div class="flex gap-2">
                        <button
                            class="btn btn-ghost btn-circle"
                            disabled=move || loading.get()
                            on:click={
                                let load_accounts = load_accounts.clone();
                                move |_| load_accounts()
                            }
                        >
                            <RefreshCw attr:class=move || {
                                if loading.get() { "h-5 w-5 animate-spin" } else { "h-5 w-5" }
                            } />
                        </button>
                        <button
                            class="btn btn-primary gap-2"
                            on:click=move |_| on_connect_new.run(())
                        >
                            <Plus attr:class="h-4 w-4" /> "Connect New"
                        </button>
                    </div>
                </div>

                <Show when=move || error_msg.get().is_some()>
                    <div role="alert" class="alert alert-error text-sm py-2">
                        <span>{move || error_msg.get().unwrap_or_default()}</span>
                    </div>
                </Show>

                <div class="overflow-x-auto">
                    <table class="table table-zebra w-full">
                        <thead>
                            <tr>
                                <th>"Provider"</th>
                                <th>"Email"</th>
                                <th>"Status"</th>
                                <th>"Last Sync"</th>
                                <th></th>
                            </tr>
                        </thead>
                        <tbody>
                            <Show when=move || loading.get() && accounts.with(Vec::is_empty)>
                                <tr>
                                    <td colspan="5" class="text-center py-8 text-base-content/50">
                                        <span class="loading loading-spinner loading-md"></span>
                                        " Loading accounts..."
                                    </td>
                                </tr>
                            </Show>
                            <Show when=move || !loading.get() && accounts.with(Vec::is_empty)>
                                <tr>
                                    <td colspan="5" class="text-center py-8 text-base-content/50">
                                        "No accounts connected yet. Connect one to start scanning."
                                    </td>
                                </tr>
                            </Show>
                            <For
                                each=move || accounts.get()
                                key=|account| account.id.clone()
                                children={
                                    let handle_remove = handle_remove.clone();
                                    move |account| {
                                        let id = account.id.clone();
                                        let handle_remove = handle_remove.clone();
                                        let status = account.status.clone().unwrap_or_else(|| "unknown".into());
                                        let last_sync = account
                                            .last_sync
                                            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                                            .unwrap_or_else(|| "—".into());
                                        view! {
                                            <tr>
                                                <td class="font-semibold uppercase">{account.provider.clone()}</td>
                                                <td class="font-mono text-sm">{account.email.clone()}</td>
                                                <td>
                                                    <span class=status_class(&status)>{status.clone()}</span>
                                                </td>
                                                <td class="text-sm opacity-70">{last_sync}</td>
                                                <td>
                                                    <button
                                                        class="btn btn-ghost btn-sm text-error"
                                                        on:click=move |_| handle_remove(id.clone())
                                                    >
                                                        <Trash2 attr:class="h-4 w-4" />
                                                    </button>
                                                </td>
                                            </tr>
                                        }
                                    }
                                }
                            />
                        </tbody>
                    </table>
                </div>
            </div>
        </div>
    }
}
