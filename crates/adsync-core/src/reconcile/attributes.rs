// ── Directory attribute mapping ──
//
// Attribute names read by load and the attribute sets written by
// synchronize. POSIX attributes follow the RFC 2307 schema as extended by
// Active Directory (`unixHomeDirectory`, `msSFU30NisDomain`).

use secrecy::ExposeSecret;

use crate::connector::{AttributeMap, AttributeValue};
use crate::model::{Group, RelativeId, ShadowFields, User};

pub const OBJECT_CLASS: &str = "objectClass";
pub const OBJECT_SID: &str = "objectSid";
pub const CN: &str = "cn";
pub const SAM_ACCOUNT_NAME: &str = "sAMAccountName";
pub const USER_PRINCIPAL_NAME: &str = "userPrincipalName";
pub const GIVEN_NAME: &str = "givenName";
pub const MIDDLE_NAME: &str = "middleName";
pub const SURNAME: &str = "sn";
pub const DISPLAY_NAME: &str = "displayName";
pub const DESCRIPTION: &str = "description";
pub const ACCOUNT_CONTROL: &str = "userAccountControl";
pub const PRIMARY_GROUP_ID: &str = "primaryGroupID";
pub const USER_PASSWORD: &str = "userPassword";
pub const GROUP_TYPE: &str = "groupType";
pub const MEMBER: &str = "member";

pub const UID_NUMBER: &str = "uidNumber";
pub const GID_NUMBER: &str = "gidNumber";
pub const LOGIN_SHELL: &str = "loginShell";
pub const HOME_DIRECTORY: &str = "unixHomeDirectory";
pub const NIS_DOMAIN: &str = "msSFU30NisDomain";
pub const GECOS: &str = "gecos";
pub const UNIX_PASSWORD: &str = "unixUserPassword";

pub const SHADOW_LAST_CHANGE: &str = "shadowLastChange";
pub const SHADOW_MIN: &str = "shadowMin";
pub const SHADOW_MAX: &str = "shadowMax";
pub const SHADOW_WARNING: &str = "shadowWarning";
pub const SHADOW_INACTIVE: &str = "shadowInactive";
pub const SHADOW_EXPIRE: &str = "shadowExpire";
pub const SHADOW_FLAG: &str = "shadowFlag";

/// Attributes requested for group entries during load.
pub const GROUP_READ: &[&str] = &[
    OBJECT_CLASS,
    OBJECT_SID,
    CN,
    SAM_ACCOUNT_NAME,
    GROUP_TYPE,
    DESCRIPTION,
    GID_NUMBER,
    NIS_DOMAIN,
    UNIX_PASSWORD,
];

/// Attributes requested for user entries during load.
pub const USER_READ: &[&str] = &[
    OBJECT_CLASS,
    OBJECT_SID,
    CN,
    SAM_ACCOUNT_NAME,
    GIVEN_NAME,
    MIDDLE_NAME,
    SURNAME,
    DISPLAY_NAME,
    DESCRIPTION,
    ACCOUNT_CONTROL,
    PRIMARY_GROUP_ID,
    UID_NUMBER,
    GID_NUMBER,
    LOGIN_SHELL,
    HOME_DIRECTORY,
    NIS_DOMAIN,
    GECOS,
    UNIX_PASSWORD,
    SHADOW_LAST_CHANGE,
    SHADOW_MIN,
    SHADOW_MAX,
    SHADOW_WARNING,
    SHADOW_INACTIVE,
    SHADOW_EXPIRE,
    SHADOW_FLAG,
];

fn classes(names: &[&str]) -> AttributeValue {
    AttributeValue::Multi(names.iter().map(|n| (*n).to_owned()).collect())
}

fn put(attrs: &mut AttributeMap, name: &str, value: Option<impl ToString>) {
    if let Some(value) = value {
        attrs.insert(name.to_owned(), AttributeValue::Single(value.to_string()));
    }
}

fn put_shadow(attrs: &mut AttributeMap, shadow: &ShadowFields) {
    put(attrs, SHADOW_LAST_CHANGE, shadow.last_change);
    put(attrs, SHADOW_MIN, shadow.min);
    put(attrs, SHADOW_MAX, shadow.max);
    put(attrs, SHADOW_WARNING, shadow.warning);
    put(attrs, SHADOW_INACTIVE, shadow.inactive);
    put(attrs, SHADOW_EXPIRE, shadow.expire);
    put(attrs, SHADOW_FLAG, shadow.flag);
}

/// Create request for a group. `members` are DNs of members that already
/// exist in the directory.
pub fn group_attributes(group: &Group, members: Vec<String>) -> AttributeMap {
    let mut attrs = AttributeMap::new();
    let class = if group.is_unix() {
        classes(&["top", "group", "posixGroup"])
    } else {
        classes(&["top", "group"])
    };
    attrs.insert(OBJECT_CLASS.into(), class);
    put(&mut attrs, CN, Some(group.name()));
    put(&mut attrs, SAM_ACCOUNT_NAME, Some(group.name()));
    put(&mut attrs, GROUP_TYPE, Some(group.group_type().raw()));
    put(&mut attrs, DESCRIPTION, group.description());

    if let Some(posix) = group.posix() {
        put(&mut attrs, GID_NUMBER, Some(posix.group_id()));
        put(&mut attrs, NIS_DOMAIN, posix.attributes().nis_domain.as_deref());
        put(
            &mut attrs,
            UNIX_PASSWORD,
            posix.attributes().unix_password.as_deref(),
        );
    }
    if !members.is_empty() {
        attrs.insert(MEMBER.into(), AttributeValue::Multi(members));
    }
    attrs
}

/// Create request for a user whose primary group has relative id
/// `primary_rid`. `domain` feeds `userPrincipalName` when non-empty.
pub fn user_attributes(user: &User, domain: &str, primary_rid: RelativeId) -> AttributeMap {
    let mut attrs = AttributeMap::new();
    let class = if user.is_unix() {
        classes(&[
            "top",
            "person",
            "organizationalPerson",
            "user",
            "posixAccount",
            "shadowAccount",
        ])
    } else {
        classes(&["top", "person", "organizationalPerson", "user"])
    };
    attrs.insert(OBJECT_CLASS.into(), class);
    put(&mut attrs, CN, Some(user.common_name()));
    put(&mut attrs, SAM_ACCOUNT_NAME, Some(user.username()));
    if !domain.is_empty() {
        put(
            &mut attrs,
            USER_PRINCIPAL_NAME,
            Some(format!("{}@{domain}", user.username())),
        );
    }
    put(&mut attrs, GIVEN_NAME, user.first_name());
    put(&mut attrs, MIDDLE_NAME, user.middle_name());
    put(&mut attrs, SURNAME, user.last_name());
    put(&mut attrs, DISPLAY_NAME, Some(user.display_name()));
    put(&mut attrs, DESCRIPTION, user.description());
    put(&mut attrs, ACCOUNT_CONTROL, Some(user.account_control().bits()));
    put(&mut attrs, PRIMARY_GROUP_ID, Some(primary_rid));
    put(
        &mut attrs,
        USER_PASSWORD,
        user.password().map(ExposeSecret::expose_secret),
    );

    if let Some(posix) = user.posix() {
        let extra = posix.attributes();
        put(&mut attrs, UID_NUMBER, Some(posix.account_id()));
        put(&mut attrs, GID_NUMBER, Some(posix.group_id()));
        put(&mut attrs, LOGIN_SHELL, extra.login_shell.as_deref());
        put(&mut attrs, HOME_DIRECTORY, extra.home_directory.as_deref());
        put(&mut attrs, NIS_DOMAIN, extra.nis_domain.as_deref());
        put(&mut attrs, GECOS, extra.gecos.as_deref());
        put(&mut attrs, UNIX_PASSWORD, extra.unix_password.as_deref());
        put_shadow(&mut attrs, &extra.shadow);
    }
    attrs
}
