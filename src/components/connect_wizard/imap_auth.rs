use leptos::prelude::*;
use leptos::task::spawn_local;

use invomail_shared::invoice::{ImapCredentials, TestConnectionRequest};
use invomail_shared::{AccountMeta, CreateAccountRequest, MailProvider};

use super::WizardState;
use crate::auth::use_api;

/// 托管提供方的 IMAP 预设（端口 993 + TLS）
fn preset_for(provider: MailProvider) -> Option<(&'static str, u16)> {
    match provider {
        MailProvider::Gmail => Some(("imap.gmail.com", 993)),
        MailProvider::Outlook => Some(("outlook.office365.com", 993)),
        MailProvider::Imap => None,
    }
}

/// 第 2 步：IMAP 凭据。先测连接，成功后保存账号，
/// 产出的凭据（含账号 ID）贯穿后续步骤。
#[component]
pub fn StepImapAuth(state: WizardState) -> impl IntoView {
    let api = use_api();

    let provider = state.provider.get_untracked().unwrap_or(MailProvider::Imap);
    let preset = preset_for(provider);

    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (host, set_host) = signal(preset.map(|(h, _)| h.to_string()).unwrap_or_default());
    let (port, set_port) = signal(preset.map(|(_, p)| p).unwrap_or(993));
    let (tls, set_tls) = signal(true);
    let (loading, set_loading) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let quick_fill = move |key: MailProvider| {
        if let Some((h, p)) = preset_for(key) {
            set_host.set(h.to_string());
            set_port.set(p);
            set_tls.set(true);
        }
    };

    let on_submit = {
        let api = api.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            set_error_msg.set(None);
            set_loading.set(true);

            let api = api.clone();
            spawn_local(async move {
                let mut creds = ImapCredentials {
                    email: email.get_untracked(),
                    password: password.get_untracked(),
                    host: host.get_untracked(),
                    port: port.get_untracked(),
                    tls: tls.get_untracked(),
                    account_id: None,
                };

                // 1) 测试 IMAP 连接
                if let Err(err) = api
                    .test_imap_connection(&TestConnectionRequest::from(&creds))
                    .await
                {
                    set_error_msg.try_set(Some(err.to_string()));
                    set_loading.try_set(false);
                    return;
                }

                // 2) 保存账号（密码由后端加密存放）
                let request = CreateAccountRequest {
                    provider: provider.as_str().to_string(),
                    email: creds.email.clone(),
                    meta: AccountMeta {
                        host: Some(creds.host.clone()),
                        port: Some(creds.port),
                        tls: Some(creds.tls),
                        password: Some(creds.password.clone()),
                    },
                };
                match api.create_account(&request).await {
                    Ok(account) => {
                        creds.account_id = account.map(|a| a.id);
                        state.creds.try_set(Some(creds));
                        // 产物就绪，推进到文件夹选择
                        state.advance();
                    }
                    Err(err) => {
                        set_error_msg.try_set(Some(err.to_string()));
                    }
                }
                set_loading.try_set(false);
            });
        }
    };

    let is_preset = preset.is_some();

    view! {
        <div>
            <h3 class="text-xl font-semibold mb-1">
                {format!("Connect {} Account", provider.display_name())}
            </h3>
            <p class="text-sm text-base-content/60 mb-4">
                {if is_preset {
                    "Enter your email and App Password; server settings are preset."
                } else {
                    "Many providers require an App Password for IMAP. Use port 993 with TLS."
                }}
            </p>

            <Show when=move || !is_preset>
                <div class="flex items-center gap-2 mb-4 text-sm">
                    <span>"Quick presets:"</span>
                    <button type="button" class="btn btn-xs" on:click=move |_| quick_fill(MailProvider::Gmail)>
                        "Gmail"
                    </button>
                    <button type="button" class="btn btn-xs" on:click=move |_| quick_fill(MailProvider::Outlook)>
                        "Outlook"
                    </button>
                </div>
            </Show>

            <form class="space-y-4 max-w-md" on:submit=on_submit>
                <div class="form-control">
                    <label class="label" for="imap-email">
                        <span class="label-text">"Email"</span>
                    </label>
                    <input
                        id="imap-email"
                        type="email"
                        placeholder="example@gmail.com"
                        on:input=move |ev| set_email.set(event_target_value(&ev))
                        prop:value=email
                        class="input input-bordered w-full"
                        required
                    />
                </div>
                <div class="form-control">
                    <label class="label" for="imap-password">
                        <span class="label-text">
                            {if is_preset { "App Password" } else { "Password / App Password" }}
                        </span>
                    </label>
                    <input
                        id="imap-password"
                        type="password"
                        placeholder="••••••••"
                        on:input=move |ev| set_password.set(event_target_value(&ev))
                        prop:value=password
                        class="input input-bordered w-full"
                        required
                    />
                </div>

                <Show when=move || !is_preset>
                    <div class="form-control">
                        <label class="label" for="imap-host">
                            <span class="label-text">"IMAP Host"</span>
                        </label>
                        <input
                            id="imap-host"
                            type="text"
                            placeholder="imap.example.com"
                            on:input=move |ev| set_host.set(event_target_value(&ev))
                            prop:value=host
                            class="input input-bordered w-full"
                            required
                        />
                    </div>
                    <div class="form-control">
                        <label class="label" for="imap-port">
                            <span class="label-text">"Port"</span>
                        </label>
                        <input
                            id="imap-port"
                            type="number"
                            min="1"
                            max="65535"
                            on:input=move |ev| {
                                if let Ok(value) = event_target_value(&ev).parse::<u16>() {
                                    set_port.set(value);
                                }
                            }
                            prop:value=move || port.get().to_string()
                            class="input input-bordered w-full"
                            required
                        />
                    </div>
                    <div class="form-control">
                        <label class="label cursor-pointer justify-start gap-3">
                            <input
                                type="checkbox"
                                class="toggle toggle-primary"
                                prop:checked=tls
                                on:change=move |ev| set_tls.set(event_target_checked(&ev))
                            />
                            <span class="label-text">"Use TLS (recommended)"</span>
                        </label>
                    </div>
                </Show>

                <Show when=move || error_msg.get().is_some()>
                    <p class="text-error text-sm whitespace-pre-wrap">
                        {move || error_msg.get().unwrap_or_default()}
                    </p>
                </Show>

                <button type="submit" class="btn btn-primary w-full" disabled=move || loading.get()>
                    {move || if loading.get() {
                        view! { <span class="loading loading-spinner"></span> "Connecting..." }.into_any()
                    } else {
                        "Connect".into_any()
                    }}
                </button>
            </form>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managed_providers_have_presets() {
        assert_eq!(preset_for(MailProvider::Gmail), Some(("imap.gmail.com", 993)));
        assert_eq!(
            preset_for(MailProvider::Outlook),
            Some(("outlook.office365.com", 993))
        );
        assert_eq!(preset_for(MailProvider::Imap), None);
    }
}
