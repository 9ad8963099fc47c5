use leptos::prelude::*;

use crate::auth::{logout, use_auth, use_session};
use crate::components::connected_accounts::AccountsSection;
use crate::components::exports::ExportsSection;
use crate::components::icons::{Download, FileText, Inbox, LogOut, Mail, Settings, Users};
use crate::components::invoices::InvoicesSection;
use crate::components::retrieval::RetrievalSection;
use crate::components::rules::RulesSection;
use crate::components::suppliers::SuppliersSection;
use crate::web::route::AppRoute;
use crate::web::router::use_router;

/// 控制台内的功能区；切换只影响本地状态，不产生路由跳转
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Section {
    #[default]
    Invoices,
    Accounts,
    Rules,
    Suppliers,
    Exports,
    Retrieval,
}

impl Section {
    const ALL: [Section; 6] = [
        Section::Invoices,
        Section::Accounts,
        Section::Rules,
        Section::Suppliers,
        Section::Exports,
        Section::Retrieval,
    ];

    fn label(&self) -> &'static str {
        match self {
            Section::Invoices => "Invoices",
            Section::Accounts => "Connected Accounts",
            Section::Rules => "Rules & Automation",
            Section::Suppliers => "Suppliers",
            Section::Exports => "Exports",
            Section::Retrieval => "Data Retrieval",
        }
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let session_ctx = use_auth();
    let handle = use_session();
    let router = use_router();

    let (section, set_section) = signal(Section::default());

    // 会话在别处被终止（登出、提供方 SIGNED_OUT）时离开受保护区
    Effect::new(move |_| {
        let state = session_ctx.state.get();
        if state.ready && !state.is_authenticated() {
            router.replace(AppRoute::auth_failure_redirect());
        }
    });

    let on_logout = {
        let handle = handle.clone();
        move |_| {
            logout(&handle);
            router.replace(AppRoute::auth_failure_redirect());
        }
    };

    let section_icon = |s: Section| match s {
        Section::Invoices => view! { <FileText attr:class="h-4 w-4" /> }.into_any(),
        Section::Accounts => view! { <Mail attr:class="h-4 w-4" /> }.into_any(),
        Section::Rules => view! { <Settings attr:class="h-4 w-4" /> }.into_any(),
        Section::Suppliers => view! { <Users attr:class="h-4 w-4" /> }.into_any(),
        Section::Exports => view! { <Download attr:class="h-4 w-4" /> }.into_any(),
        Section::Retrieval => view! { <Inbox attr:class="h-4 w-4" /> }.into_any(),
    };

    view! {
        <div class="min-h-screen bg-base-200 font-sans">
            <div class="navbar bg-base-100 shadow-md px-4">
                <div class="flex-1 gap-2">
                    <Mail attr:class="text-primary h-6 w-6" />
                    <span class="text-xl font-bold">"Mail Invoices"</span>
                </div>
                <div class="flex-none gap-3">
                    <span class="badge badge-neutral hidden md:inline-flex">
                        {move || session_ctx.state.get().email().unwrap_or_else(|| "Signed in".into())}
                    </span>
                    <button on:click=on_logout class="btn btn-outline btn-error btn-sm gap-2">
                        <LogOut attr:class="h-4 w-4" /> "Sign out"
                    </button>
                </div>
            </div>

            <div class="flex">
                <aside class="w-56 min-h-screen bg-base-100 shadow-md p-4">
                    <ul class="menu gap-1">
                        <For
                            each=move || Section::ALL
                            key=|s| s.label()
                            children=move |s| {
                                view! {
                                    <li>
                                        <a
                                            class=move || {
                                                if section.get() == s { "active" } else { "" }
                                            }
                                            on:click=move |_| set_section.set(s)
                                        >
                                            {section_icon(s)}
                                            {s.label()}
                                        </a>
                                    </li>
                                }
                            }
                        />
                    </ul>
                </aside>

                <main class="flex-1 p-6">
                    {move || match section.get() {
                        Section::Invoices => view! { <InvoicesSection /> }.into_any(),
                        Section::Accounts => view! { <AccountsSection /> }.into_any(),
                        Section::Rules => view! { <RulesSection /> }.into_any(),
                        Section::Suppliers => view! { <SuppliersSection /> }.into_any(),
                        Section::Exports => view! { <ExportsSection /> }.into_any(),
                        Section::Retrieval => view! { <RetrievalSection /> }.into_any(),
                    }}
                </main>
            </div>
        </div>
    }
}
