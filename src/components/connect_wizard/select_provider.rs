use leptos::prelude::*;

use invomail_shared::MailProvider;

use super::WizardState;
use crate::components::icons::{Inbox, Mail};

/// 第 1 步：选择邮箱提供方；选中即进入认证步
#[component]
pub fn StepSelectProvider(state: WizardState) -> impl IntoView {
    let choose = move |provider: MailProvider| {
        state.provider.set(Some(provider));
        // 换提供方后旧凭据作废
        state.creds.set(None);
        state.advance();
    };

    let card = move |provider: MailProvider, hint: &'static str| {
        let selected = move || state.provider.get() == Some(provider);
        view! {
            <button
                class=move || {
                    if selected() {
                        "card border-2 border-primary bg-base-200 p-6 text-left"
                    } else {
                        "card border border-base-300 hover:border-base-content/40 p-6 text-left"
                    }
                }
                on:click=move |_| choose(provider)
            >
                <div class="flex items-center gap-3">
                    {if provider == MailProvider::Imap {
                        view! { <Inbox attr:class="h-6 w-6 text-primary" /> }.into_any()
                    } else {
                        view! { <Mail attr:class="h-6 w-6 text-primary" /> }.into_any()
                    }}
                    <div>
                        <div class="font-bold">{provider.display_name()}</div>
                        <div class="text-sm text-base-content/60">{hint}</div>
                    </div>
                </div>
            </button>
        }
    };

    view! {
        <div>
            <h3 class="text-xl font-semibold mb-4">"Select your mail provider"</h3>
            <div class="grid grid-cols-1 md:grid-cols-3 gap-4">
                {card(MailProvider::Gmail, "App password, preset IMAP host")}
                {card(MailProvider::Outlook, "App password, preset IMAP host")}
                {card(MailProvider::Imap, "Any mailbox with IMAP access")}
            </div>
        </div>
    }
}
