//! Built-in ActiveSync code pages.
//!
//! Each table lists `(code, local name)` pairs for one namespace. Codes are the low 6 bits of a
//! tag byte; the namespace URI is the page name followed by `:`.

pub(crate) type Table = &'static [(u8, &'static str)];

pub(crate) const AIRSYNC: Table = &[
    (0x05, "Sync"),
    (0x06, "Responses"),
    (0x07, "Add"),
    (0x08, "Change"),
    (0x09, "Delete"),
    (0x0a, "Fetch"),
    (0x0b, "SyncKey"),
    (0x0c, "ClientId"),
    (0x0d, "ServerId"),
    (0x0e, "Status"),
    (0x0f, "Collection"),
    (0x10, "Class"),
    (0x11, "Version"),
    (0x12, "CollectionId"),
    (0x13, "GetChanges"),
    (0x14, "MoreAvailable"),
    (0x15, "WindowSize"),
    (0x16, "Commands"),
    (0x17, "Options"),
    (0x18, "FilterType"),
    (0x19, "Truncation"),
    (0x1a, "RtfTruncation"),
    (0x1b, "Conflict"),
    (0x1c, "Collections"),
    (0x1d, "ApplicationData"),
    (0x1e, "DeletesAsMoves"),
    (0x1f, "NotifyGUID"),
    (0x20, "Supported"),
    (0x21, "SoftDelete"),
    (0x22, "MIMESupport"),
    (0x23, "MIMETruncation"),
    (0x24, "Wait"),
    (0x25, "Limit"),
    (0x26, "Partial"),
    (0x27, "ConversationMode"),
    (0x28, "MaxItems"),
    (0x29, "HeartbeatInterval"),
];

pub(crate) const CONTACTS: Table = &[
    (0x05, "Anniversary"),
    (0x06, "AssistantName"),
    (0x07, "AssistantPhoneNumber"),
    (0x08, "Birthday"),
    (0x09, "Body"),
    (0x0a, "BodySize"),
    (0x0b, "BodyTruncated"),
    (0x0c, "Business2PhoneNumber"),
    (0x0d, "BusinessAddressCity"),
    (0x0e, "BusinessAddressCountry"),
    (0x0f, "BusinessAddressPostalCode"),
    (0x10, "BusinessAddressState"),
    (0x11, "BusinessAddressStreet"),
    (0x12, "BusinessFaxNumber"),
    (0x13, "BusinessPhoneNumber"),
    (0x14, "CarPhoneNumber"),
    (0x15, "Categories"),
    (0x16, "Category"),
    (0x17, "Children"),
    (0x18, "Child"),
    (0x19, "CompanyName"),
    (0x1a, "Department"),
    (0x1b, "Email1Address"),
    (0x1c, "Email2Address"),
    (0x1d, "Email3Address"),
    (0x1e, "FileAs"),
    (0x1f, "FirstName"),
    (0x20, "Home2PhoneNumber"),
    (0x21, "HomeAddressCity"),
    (0x22, "HomeAddressCountry"),
    (0x23, "HomeAddressPostalCode"),
    (0x24, "HomeAddressState"),
    (0x25, "HomeAddressStreet"),
    (0x26, "HomeFaxNumber"),
    (0x27, "HomePhoneNumber"),
    (0x28, "JobTitle"),
    (0x29, "LastName"),
    (0x2a, "MiddleName"),
    (0x2b, "MobilePhoneNumber"),
    (0x2c, "OfficeLocation"),
    (0x2d, "OtherAddressCity"),
    (0x2e, "OtherAddressCountry"),
    (0x2f, "OtherAddressPostalCode"),
    (0x30, "OtherAddressState"),
    (0x31, "OtherAddressStreet"),
    (0x32, "PagerNumber"),
    (0x33, "RadioPhoneNumber"),
    (0x34, "Spouse"),
    (0x35, "Suffix"),
    (0x36, "Title"),
    (0x37, "WebPage"),
    (0x38, "YomiCompanyName"),
    (0x39, "YomiFirstName"),
    (0x3a, "YomiLastName"),
    (0x3b, "CompressedRTF"),
    (0x3c, "Picture"),
    (0x3d, "Alias"),
    (0x3e, "WeightedRank"),
];

pub(crate) const EMAIL: Table = &[
    (0x05, "Attachment"),
    (0x06, "Attachments"),
    (0x07, "AttName"),
    (0x08, "AttSize"),
    (0x09, "Att0Id"),
    (0x0a, "AttMethod"),
    (0x0b, "AttRemoved"),
    (0x0c, "Body"),
    (0x0d, "BodySize"),
    (0x0e, "BodyTruncated"),
    (0x0f, "DateReceived"),
    (0x10, "DisplayName"),
    (0x11, "DisplayTo"),
    (0x12, "Importance"),
    (0x13, "MessageClass"),
    (0x14, "Subject"),
    (0x15, "Read"),
    (0x16, "To"),
    (0x17, "Cc"),
    (0x18, "From"),
    (0x19, "ReplyTo"),
    (0x1a, "AllDayEvent"),
    (0x1b, "Categories"),
    (0x1c, "Category"),
    (0x1d, "DtStamp"),
    (0x1e, "EndTime"),
    (0x1f, "InstanceType"),
    (0x20, "BusyStatus"),
    (0x21, "Location"),
    (0x22, "MeetingRequest"),
    (0x23, "Organizer"),
    (0x24, "RecurrenceId"),
    (0x25, "Reminder"),
    (0x26, "ResponseRequested"),
    (0x27, "Recurrences"),
    (0x28, "Recurrence"),
    (0x29, "Type"),
    (0x2a, "Until"),
    (0x2b, "Occurrences"),
    (0x2c, "Interval"),
    (0x2d, "DayOfWeek"),
    (0x2e, "DayOfMonth"),
    (0x2f, "WeekOfMonth"),
    (0x30, "MonthOfYear"),
    (0x31, "StartTime"),
    (0x32, "Sensitivity"),
    (0x33, "TimeZone"),
    (0x34, "GlobalObjId"),
    (0x35, "ThreadTopic"),
    (0x36, "MIMEData"),
    (0x37, "MIMETruncated"),
    (0x38, "MIMESize"),
    (0x39, "InternetCPID"),
    (0x3a, "Flag"),
    (0x3b, "FlagStatus"),
    (0x3c, "ContentClass"),
    (0x3d, "FlagType"),
    (0x3e, "CompleteTime"),
    (0x3f, "DisallowNewTimeProposal"),
];

pub(crate) const CALENDAR: Table = &[
    (0x05, "TimeZone"),
    (0x06, "AllDayEvent"),
    (0x07, "Attendees"),
    (0x08, "Attendee"),
    (0x09, "Email"),
    (0x0a, "Name"),
    (0x0b, "Body"),
    (0x0c, "BodyTruncated"),
    (0x0d, "BusyStatus"),
    (0x0e, "Categories"),
    (0x0f, "Category"),
    (0x10, "CompressedRTF"),
    (0x11, "DtStamp"),
    (0x12, "EndTime"),
    (0x13, "Exception"),
    (0x14, "Exceptions"),
    (0x15, "Deleted"),
    (0x16, "ExceptionStartTime"),
    (0x17, "Location"),
    (0x18, "MeetingStatus"),
    (0x19, "OrganizerEmail"),
    (0x1a, "OrganizerName"),
    (0x1b, "Recurrence"),
    (0x1c, "Type"),
    (0x1d, "Until"),
    (0x1e, "Occurrences"),
    (0x1f, "Interval"),
    (0x20, "DayOfWeek"),
    (0x21, "DayOfMonth"),
    (0x22, "WeekOfMonth"),
    (0x23, "MonthOfYear"),
    (0x24, "Reminder"),
    (0x25, "Sensitivity"),
    (0x26, "Subject"),
    (0x27, "StartTime"),
    (0x28, "UID"),
    (0x29, "AttendeeStatus"),
    (0x2a, "AttendeeType"),
    (0x33, "DisallowNewTimeProposal"),
    (0x34, "ResponseRequested"),
    (0x35, "AppointmentReplyTime"),
    (0x36, "ResponseType"),
    (0x37, "CalendarType"),
    (0x38, "IsLeapMonth"),
    (0x39, "FirstDayOfWeek"),
    (0x3a, "OnlineMeetingConfLink"),
    (0x3b, "OnlineMeetingExternalLink"),
];

pub(crate) const MOVE: Table = &[
    (0x05, "MoveItems"),
    (0x06, "Move"),
    (0x07, "SrcMsgId"),
    (0x08, "SrcFldId"),
    (0x09, "DstFldId"),
    (0x0a, "Response"),
    (0x0b, "Status"),
    (0x0c, "DstMsgId"),
];

pub(crate) const GET_ITEM_ESTIMATE: Table = &[
    (0x05, "GetItemEstimate"),
    (0x06, "Version"),
    (0x07, "Collections"),
    (0x08, "Collection"),
    (0x09, "Class"),
    (0x0a, "CollectionId"),
    (0x0b, "DateTime"),
    (0x0c, "Estimate"),
    (0x0d, "Response"),
    (0x0e, "Status"),
];

pub(crate) const FOLDER_HIERARCHY: Table = &[
    (0x05, "Folders"),
    (0x06, "Folder"),
    (0x07, "DisplayName"),
    (0x08, "ServerId"),
    (0x09, "ParentId"),
    (0x0a, "Type"),
    (0x0b, "Response"),
    (0x0c, "Status"),
    (0x0d, "ContentClass"),
    (0x0e, "Changes"),
    (0x0f, "Add"),
    (0x10, "Delete"),
    (0x11, "Update"),
    (0x12, "SyncKey"),
    (0x13, "FolderCreate"),
    (0x14, "FolderDelete"),
    (0x15, "FolderUpdate"),
    (0x16, "FolderSync"),
    (0x17, "Count"),
    (0x18, "Version"),
];

pub(crate) const MEETING_RESPONSE: Table = &[
    (0x05, "CalendarId"),
    (0x06, "CollectionId"),
    (0x07, "MeetingResponse"),
    (0x08, "RequestId"),
    (0x09, "Request"),
    (0x0a, "Result"),
    (0x0b, "Status"),
    (0x0c, "UserResponse"),
    (0x0e, "InstanceId"),
];

pub(crate) const TASKS: Table = &[
    (0x05, "Body"),
    (0x06, "BodySize"),
    (0x07, "BodyTruncated"),
    (0x08, "Categories"),
    (0x09, "Category"),
    (0x0a, "Complete"),
    (0x0b, "DateCompleted"),
    (0x0c, "DueDate"),
    (0x0d, "UtcDueDate"),
    (0x0e, "Importance"),
    (0x0f, "Recurrence"),
    (0x10, "Type"),
    (0x11, "Start"),
    (0x12, "Until"),
    (0x13, "Occurrences"),
    (0x14, "Interval"),
    (0x15, "DayOfMonth"),
    (0x16, "DayOfWeek"),
    (0x17, "WeekOfMonth"),
    (0x18, "MonthOfYear"),
    (0x19, "Regenerate"),
    (0x1a, "DeadOccur"),
    (0x1b, "ReminderSet"),
    (0x1c, "ReminderTime"),
    (0x1d, "Sensitivity"),
    (0x1e, "StartDate"),
    (0x1f, "UtcStartDate"),
    (0x20, "Subject"),
    (0x22, "OrdinalDate"),
    (0x23, "SubOrdinalDate"),
    (0x24, "CalendarType"),
    (0x25, "IsLeapMonth"),
    (0x26, "FirstDayOfWeek"),
];

pub(crate) const CONTACTS2: Table = &[
    (0x05, "CustomerId"),
    (0x06, "GovernmentId"),
    (0x07, "IMAddress"),
    (0x08, "IMAddress2"),
    (0x09, "IMAddress3"),
    (0x0a, "ManagerName"),
    (0x0b, "CompanyMainPhone"),
    (0x0c, "AccountName"),
    (0x0d, "NickName"),
    (0x0e, "MMS"),
];

pub(crate) const PING: Table = &[
    (0x05, "Ping"),
    (0x06, "AutdState"),
    (0x07, "Status"),
    (0x08, "HeartbeatInterval"),
    (0x09, "Folders"),
    (0x0a, "Folder"),
    (0x0b, "Id"),
    (0x0c, "Class"),
    (0x0d, "MaxFolders"),
];

pub(crate) const PROVISION: Table = &[
    (0x05, "Provision"),
    (0x06, "Policies"),
    (0x07, "Policy"),
    (0x08, "PolicyType"),
    (0x09, "PolicyKey"),
    (0x0a, "Data"),
    (0x0b, "Status"),
    (0x0c, "RemoteWipe"),
    (0x0d, "EASProvisionDoc"),
    (0x0e, "DevicePasswordEnabled"),
    (0x0f, "AlphanumericDevicePasswordRequired"),
    (0x10, "RequireStorageCardEncryption"),
    (0x11, "PasswordRecoveryEnabled"),
    (0x13, "AttachmentsEnabled"),
    (0x14, "MinDevicePasswordLength"),
    (0x15, "MaxInactivityTimeDeviceLock"),
    (0x16, "MaxDevicePasswordFailedAttempts"),
    (0x17, "MaxAttachmentSize"),
    (0x18, "AllowSimpleDevicePassword"),
    (0x19, "DevicePasswordExpiration"),
    (0x1a, "DevicePasswordHistory"),
];

pub(crate) const AIRSYNC_BASE: Table = &[
    (0x05, "BodyPreference"),
    (0x06, "Type"),
    (0x07, "TruncationSize"),
    (0x08, "AllOrNone"),
    (0x0a, "Body"),
    (0x0b, "Data"),
    (0x0c, "EstimatedDataSize"),
    (0x0d, "Truncated"),
    (0x0e, "Attachments"),
    (0x0f, "Attachment"),
    (0x10, "DisplayName"),
    (0x11, "FileReference"),
    (0x12, "Method"),
    (0x13, "ContentId"),
    (0x14, "ContentLocation"),
    (0x15, "IsInline"),
    (0x16, "NativeBodyType"),
    (0x17, "ContentType"),
    (0x18, "Preview"),
    (0x19, "BodyPartPreference"),
    (0x1a, "BodyPart"),
    (0x1b, "Status"),
];

pub(crate) const SETTINGS: Table = &[
    (0x05, "Settings"),
    (0x06, "Status"),
    (0x07, "Get"),
    (0x08, "Set"),
    (0x09, "Oof"),
    (0x0a, "OofState"),
    (0x0b, "StartTime"),
    (0x0c, "EndTime"),
    (0x0d, "OofMessage"),
    (0x0e, "AppliesToInternal"),
    (0x0f, "AppliesToExternalKnown"),
    (0x10, "AppliesToExternalUnknown"),
    (0x11, "Enabled"),
    (0x12, "ReplyMessage"),
    (0x13, "BodyType"),
    (0x14, "DevicePassword"),
    (0x15, "Password"),
    (0x16, "DeviceInformation"),
    (0x17, "Model"),
    (0x18, "IMEI"),
    (0x19, "FriendlyName"),
    (0x1a, "OS"),
    (0x1b, "OSLanguage"),
    (0x1c, "PhoneNumber"),
    (0x1d, "UserInformation"),
    (0x1e, "EmailAddresses"),
    (0x1f, "SmtpAddress"),
    (0x20, "UserAgent"),
    (0x21, "EnableOutboundSMS"),
    (0x22, "MobileOperator"),
    (0x23, "PrimarySmtpAddress"),
    (0x24, "Accounts"),
    (0x25, "Account"),
    (0x26, "AccountId"),
    (0x27, "AccountName"),
    (0x28, "UserDisplayName"),
    (0x29, "SendDisabled"),
    (0x2b, "RightsManagementInformation"),
];

/// Every built-in page: index, namespace URI, table.
pub(crate) const ACTIVESYNC: &[(u8, &str, Table)] = &[
    (0, "AirSync:", AIRSYNC),
    (1, "Contacts:", CONTACTS),
    (2, "Email:", EMAIL),
    (4, "Calendar:", CALENDAR),
    (5, "Move:", MOVE),
    (6, "GetItemEstimate:", GET_ITEM_ESTIMATE),
    (7, "FolderHierarchy:", FOLDER_HIERARCHY),
    (8, "MeetingResponse:", MEETING_RESPONSE),
    (9, "Tasks:", TASKS),
    (12, "Contacts2:", CONTACTS2),
    (13, "Ping:", PING),
    (14, "Provision:", PROVISION),
    (17, "AirSyncBase:", AIRSYNC_BASE),
    (18, "Settings:", SETTINGS),
];
